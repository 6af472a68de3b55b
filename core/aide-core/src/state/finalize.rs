//! Session-end orchestration.
//!
//! One forward pass per session: resolve the current-work record, complete
//! the work directory, write the resume pointers, delete the record.
//! Cleanup runs last so a crash mid-sequence can only leave the record in
//! place for a retry, never lose it before the other steps saw it.
//!
//! Each step is attempted independently and failures are isolated: a
//! degraded metadata write does not prevent the resume pointers or the
//! cleanup. The function is infallible by contract - the host's shutdown
//! sequence must never be blocked by this subsystem - so outcomes are
//! reported as values and logged, never propagated.

use chrono::Utc;

use crate::input::UNKNOWN_SESSION;
use crate::storage::StorageConfig;

use super::cleanup;
use super::resolver::{self, RecordSource};
use super::resume;
use super::transition;
use super::types::{SkipReason, StepOutcome};

/// What each finalize step did, for logging and for tests that need to
/// know which step degraded.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeReport {
    pub session_id: String,
    /// The work directory named by the resolved record, if any.
    pub work_dir: Option<String>,
    /// Where the record was found, when one was found.
    pub resolved_from: Option<RecordSource>,
    pub transition: StepOutcome,
    pub resume: StepOutcome,
    pub resume_legacy: StepOutcome,
    pub cleanup: StepOutcome,
}

/// Finalizes `session_id`: the single forward transition from
/// awaiting-finalize to finalized. Idempotent - a second run resolves no
/// record and every step reports a typed skip.
pub fn finalize_session(storage: &StorageConfig, session_id: &str) -> FinalizeReport {
    let now = Utc::now();

    let resolved = resolver::resolve_record(storage, session_id);
    let work_dir = resolved
        .as_ref()
        .and_then(|r| r.record.work_dir.clone());

    let transition = match work_dir.as_deref() {
        Some(dir) => transition::complete_work_dir(storage, dir, now),
        None if resolved.is_some() => StepOutcome::Skipped(SkipReason::NoWorkDir),
        None => StepOutcome::Skipped(SkipReason::NoRecord),
    };

    // The "unknown" sentinel means the host supplied no session context;
    // a resume pointer for it would be unusable.
    let (resume, resume_legacy) = if session_id == UNKNOWN_SESSION {
        (
            StepOutcome::Skipped(SkipReason::UnknownSession),
            StepOutcome::Skipped(SkipReason::UnknownSession),
        )
    } else {
        let out = resume::write_resume_pointers(storage, session_id, work_dir.as_deref(), now);
        (out.keyed, out.legacy)
    };

    let cleanup = match &resolved {
        Some(r) => cleanup::remove_record(&r.path),
        None => {
            tracing::info!(session = %session_id, "No current work to complete for this session");
            StepOutcome::Skipped(SkipReason::NoRecord)
        }
    };

    FinalizeReport {
        session_id: session_id.to_string(),
        work_dir,
        resolved_from: resolved.map(|r| r.source),
        transition,
        resume,
        resume_legacy,
        cleanup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fs_err as fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, StorageConfig) {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        storage.ensure_dirs().unwrap();
        (temp, storage)
    }

    fn seed_session(storage: &StorageConfig, session_id: &str, work_dir: &str) {
        fs::write(
            storage.current_work_file(session_id),
            format!(
                r#"{{"session_id":"{session_id}","work_dir":"{work_dir}","created_at":"2024-01-15T09:00:00.000Z","item_count":3}}"#
            ),
        )
        .unwrap();
        let meta = storage.work_meta_file(work_dir);
        fs::create_dir_all(meta.parent().unwrap()).unwrap();
        fs::write(meta, "status: \"ACTIVE\"\ncompleted_at: null\n").unwrap();
    }

    #[test]
    fn test_full_pass_applies_every_step() {
        let (_temp, storage) = setup();
        seed_session(&storage, "s1", "task");

        let report = finalize_session(&storage, "s1");

        assert_eq!(report.resolved_from, Some(RecordSource::SessionKeyed));
        assert!(report.transition.applied());
        assert!(report.resume.applied());
        assert!(report.resume_legacy.applied());
        assert!(report.cleanup.applied());
    }

    #[test]
    fn test_no_record_skips_everything_but_resume() {
        let (_temp, storage) = setup();

        let report = finalize_session(&storage, "s1");

        assert_eq!(report.transition, StepOutcome::Skipped(SkipReason::NoRecord));
        // The resume pointer is still written (work_dir null) so the
        // session stays resumable.
        assert!(report.resume.applied());
        assert_eq!(report.cleanup, StepOutcome::Skipped(SkipReason::NoRecord));
        assert!(storage.resume_file("s1").exists());
    }

    #[test]
    fn test_record_without_work_dir_still_cleans_up() {
        let (_temp, storage) = setup();
        fs::write(
            storage.current_work_file("s1"),
            r#"{"session_id":"s1","work_dir":null}"#,
        )
        .unwrap();

        let report = finalize_session(&storage, "s1");

        assert_eq!(
            report.transition,
            StepOutcome::Skipped(SkipReason::NoWorkDir)
        );
        assert!(report.cleanup.applied());
        assert!(!storage.current_work_file("s1").exists());
    }

    #[test]
    fn test_unknown_session_writes_no_resume_pointer() {
        let (_temp, storage) = setup();

        let report = finalize_session(&storage, "unknown");

        assert_eq!(
            report.resume,
            StepOutcome::Skipped(SkipReason::UnknownSession)
        );
        assert!(!storage.resume_file("unknown").exists());
        assert!(!storage.legacy_resume_file().exists());
    }

    #[test]
    fn test_missing_meta_does_not_block_resume_or_cleanup() {
        let (_temp, storage) = setup();
        fs::write(
            storage.current_work_file("s1"),
            r#"{"session_id":"s1","work_dir":"gone"}"#,
        )
        .unwrap();

        let report = finalize_session(&storage, "s1");

        assert_eq!(
            report.transition,
            StepOutcome::Skipped(SkipReason::MissingMeta)
        );
        assert!(report.resume.applied());
        assert!(report.cleanup.applied());
    }
}
