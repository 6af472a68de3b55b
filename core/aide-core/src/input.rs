//! Hook input boundary.
//!
//! The host delivers a single JSON object on the hook's standard input.
//! Both fields are optional, and the parse policy is deliberately lax:
//! blank input means "nothing happened", unparsable input degrades to an
//! empty payload so the shutdown sequence is never blocked by a bad write
//! on the host's side.

use serde::Deserialize;

/// Sentinel session id used when the host supplied no session context.
///
/// Records are still resolved for it (a legacy record could literally
/// carry `"unknown"`), but no resume pointer is ever written for it.
pub const UNKNOWN_SESSION: &str = "unknown";

/// Payload delivered by the host on a lifecycle event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
}

impl HookInput {
    /// Parses raw stdin contents.
    ///
    /// Returns `None` for blank input (the caller should do nothing at
    /// all) and a default payload when the input is not valid JSON.
    pub fn parse(raw: &str) -> Option<HookInput> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str(trimmed) {
            Ok(input) => Some(input),
            Err(e) => {
                tracing::debug!(error = %e, "Unparsable hook input, continuing without session context");
                Some(HookInput::default())
            }
        }
    }

    /// The session id to finalize, falling back to the `"unknown"` sentinel.
    pub fn session_id(&self) -> &str {
        self.session_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_SESSION)
    }
}
