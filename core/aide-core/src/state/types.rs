//! Serialized state records and per-step outcome types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Ephemeral record of the work a session currently has in progress.
///
/// Written by the external work recorder, consumed (and deleted) by the
/// finalizer. Only `session_id` is required on parse; everything else is
/// defaulted so older records stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWorkRecord {
    pub session_id: String,
    #[serde(default)]
    pub work_dir: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub item_count: u32,
}

/// Durable pointer allowing a past session to be re-entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub session_id: String,
    pub resume_command: String,
    /// Work directory active at end of session, if any.
    pub work_dir: Option<String>,
    pub ended_at: DateTime<Utc>,
}

impl ResumeRecord {
    pub fn new(session_id: &str, work_dir: Option<&str>, ended_at: DateTime<Utc>) -> Self {
        ResumeRecord {
            session_id: session_id.to_string(),
            resume_command: format!("claude --resume {session_id}"),
            work_dir: work_dir.map(str::to_string),
            ended_at,
        }
    }
}

/// Formats a timestamp the way the metadata files expect it
/// (RFC 3339, millisecond precision, `Z` suffix).
pub fn iso_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Why a finalize step chose not to act. These are expected conditions,
/// not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No current-work record resolved for this session.
    NoRecord,
    /// The resolved record does not name a work directory.
    NoWorkDir,
    /// The work directory has no metadata file.
    MissingMeta,
    /// Metadata already shows a terminal status.
    AlreadyCompleted,
    /// Metadata fields are not in the expected unset state.
    UnexpectedFormat,
    /// The work directory name does not resolve under the work root.
    InvalidWorkDir,
    /// No resume pointer is written for the "unknown" sentinel session.
    UnknownSession,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::NoRecord => "no record",
            SkipReason::NoWorkDir => "no work dir",
            SkipReason::MissingMeta => "missing metadata",
            SkipReason::AlreadyCompleted => "already completed",
            SkipReason::UnexpectedFormat => "unexpected format",
            SkipReason::InvalidWorkDir => "invalid work dir",
            SkipReason::UnknownSession => "unknown session",
        };
        f.write_str(text)
    }
}

/// Result of one finalize step.
///
/// Failures are carried as values, not propagated: the finalizer must
/// complete every remaining step regardless of which one degraded, and
/// tests assert on these rather than on log text.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step changed state on disk.
    Applied,
    /// The step had nothing to do.
    Skipped(SkipReason),
    /// The step tried and failed; the message is for the log stream.
    Failed(String),
}

impl StepOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, StepOutcome::Applied)
    }

    pub fn skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped(_))
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Applied => f.write_str("applied"),
            StepOutcome::Skipped(reason) => write!(f, "skipped ({reason})"),
            StepOutcome::Failed(msg) => write!(f, "failed ({msg})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resume_record_embeds_session_in_command() {
        let now = Utc::now();
        let record = ResumeRecord::new("abc123", Some("2024-01-15-task"), now);
        assert_eq!(record.resume_command, "claude --resume abc123");
        assert_eq!(record.work_dir.as_deref(), Some("2024-01-15-task"));
    }

    #[test]
    fn test_resume_record_serializes_null_work_dir() {
        let now = Utc::now();
        let record = ResumeRecord::new("s1", None, now);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["work_dir"].is_null());
    }

    #[test]
    fn test_current_work_record_tolerates_missing_fields() {
        let record: CurrentWorkRecord =
            serde_json::from_str(r#"{"session_id":"s1"}"#).unwrap();
        assert_eq!(record.session_id, "s1");
        assert!(record.work_dir.is_none());
        assert_eq!(record.item_count, 0);
    }

    #[test]
    fn test_iso_timestamp_format() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(iso_timestamp(t), "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn test_step_outcome_display() {
        assert_eq!(StepOutcome::Applied.to_string(), "applied");
        assert_eq!(
            StepOutcome::Skipped(SkipReason::NoRecord).to_string(),
            "skipped (no record)"
        );
    }
}
