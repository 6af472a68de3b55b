//! Removes the consumed current-work record.
//!
//! Deletes exactly the path the resolver validated as belonging to this
//! session, so a legacy record owned by a different session can never be
//! deleted from here. A file that vanished between resolve and delete
//! (a lost race, or a duplicate finalize delivery) is a no-op, not an
//! error.

use std::io;
use std::path::Path;

use fs_err as fs;

use super::types::{SkipReason, StepOutcome};

/// Deletes the record at `path`.
pub fn remove_record(path: &Path) -> StepOutcome {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Cleared session work state");
            StepOutcome::Applied
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Current-work record already removed");
            StepOutcome::Skipped(SkipReason::NoRecord)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove current-work record");
            StepOutcome::Failed(format!("remove record: {e}"))
        }
    }
}
