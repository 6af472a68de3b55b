//! Persists resume pointers at session end.
//!
//! Two files are written: the session-keyed pointer, and the single legacy
//! "most recent session" pointer that is always overwritten regardless of
//! which session just ended. The writes are independent - a failure on one
//! is recorded and logged but never blocks the other. There is no
//! read-before-write: last writer wins, since each session's finalizer
//! runs once.

use std::path::Path;

use chrono::{DateTime, Utc};
use fs_err as fs;

use crate::storage::{write_atomic, StorageConfig};

use super::types::{ResumeRecord, StepOutcome};

/// Outcome of the two independent pointer writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeOutcome {
    pub keyed: StepOutcome,
    pub legacy: StepOutcome,
}

/// Writes `resume-{session_id}.json` and overwrites `last-resume.json`.
///
/// Idempotent: re-invocation with the same inputs overwrites both files
/// with identical content.
pub fn write_resume_pointers(
    storage: &StorageConfig,
    session_id: &str,
    work_dir: Option<&str>,
    now: DateTime<Utc>,
) -> ResumeOutcome {
    let record = ResumeRecord::new(session_id, work_dir, now);
    let payload = match serde_json::to_string_pretty(&record) {
        Ok(p) => p,
        Err(e) => {
            let msg = format!("serialize resume record: {e}");
            tracing::warn!(session = %session_id, error = %e, "Failed to serialize resume record");
            return ResumeOutcome {
                keyed: StepOutcome::Failed(msg.clone()),
                legacy: StepOutcome::Failed(msg),
            };
        }
    };

    let keyed = write_pointer(&storage.resume_file(session_id), &payload);
    let legacy = write_pointer(&storage.legacy_resume_file(), &payload);

    if keyed.applied() {
        tracing::debug!(session = %session_id, command = %record.resume_command, "Resume command saved");
    }

    ResumeOutcome { keyed, legacy }
}

fn write_pointer(path: &Path, payload: &str) -> StepOutcome {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to create state directory");
            return StepOutcome::Failed(format!("create state dir: {e}"));
        }
    }
    match write_atomic(path, payload) {
        Ok(()) => StepOutcome::Applied,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write resume pointer");
            StepOutcome::Failed(format!("write resume pointer: {e}"))
        }
    }
}
