//! SessionEnd event handler.
//!
//! Reads the hook payload from stdin and runs the session finalizer.
//! Input policy (in order):
//!
//! - blank stdin: nothing happened, touch no state
//! - unparsable JSON: continue with the `"unknown"` session sentinel
//! - missing `session_id`: same sentinel

use std::io::{self, Read};

use aide_core::input::HookInput;
use aide_core::state::finalize_session;
use aide_core::storage::StorageConfig;

pub fn run() -> Result<(), String> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| format!("Failed to read stdin: {e}"))?;

    let hook_input = match HookInput::parse(&input) {
        Some(h) => h,
        None => return Ok(()),
    };

    let storage =
        StorageConfig::discover().ok_or_else(|| "Cannot determine home directory".to_string())?;

    let report = finalize_session(&storage, hook_input.session_id());

    tracing::info!(
        session = %report.session_id,
        work_dir = report.work_dir.as_deref().unwrap_or("-"),
        transition = %report.transition,
        resume = %report.resume,
        resume_legacy = %report.resume_legacy,
        cleanup = %report.cleanup,
        "Session ended, work state finalized"
    );

    Ok(())
}
