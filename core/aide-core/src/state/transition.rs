//! Flips a work directory's metadata from ACTIVE to COMPLETED.
//!
//! `META.yaml` is simple key-per-line text that may contain hand-authored
//! fields we know nothing about, so the rewrite is line-preserving: only
//! the `status` and `completed_at` lines change, every other byte stays.
//!
//! The transition fires only when both fields are in the expected unset
//! state (`status: "ACTIVE"` and `completed_at: null`) - they flip
//! together, keeping the invariant that `completed_at` is non-null exactly
//! when the status is COMPLETED. Everything else is a typed skip, so
//! "already completed" is distinguishable from "record predates this
//! format" without touching the file.

use std::io;

use chrono::{DateTime, Utc};
use fs_err as fs;

use crate::storage::{write_atomic, StorageConfig};

use super::types::{iso_timestamp, SkipReason, StepOutcome};

const STATUS_KEY: &str = "status";
const COMPLETED_AT_KEY: &str = "completed_at";
const STATUS_ACTIVE: &str = "\"ACTIVE\"";
const STATUS_COMPLETED: &str = "\"COMPLETED\"";

/// Marks `work_dir` completed as of `now`.
///
/// Missing metadata, an already-completed directory, and unrecognized
/// field states all skip silently; re-running after a completed
/// transition is a no-op.
pub fn complete_work_dir(
    storage: &StorageConfig,
    work_dir: &str,
    now: DateTime<Utc>,
) -> StepOutcome {
    if !is_plain_dir_name(work_dir) {
        tracing::warn!(work_dir = %work_dir, "Work directory name does not resolve under the work root");
        return StepOutcome::Skipped(SkipReason::InvalidWorkDir);
    }

    let meta_path = storage.work_meta_file(work_dir);
    let content = match fs::read_to_string(&meta_path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return StepOutcome::Skipped(SkipReason::MissingMeta);
        }
        Err(e) => return StepOutcome::Failed(format!("read metadata: {e}")),
    };

    match rewrite_completed(&content, now) {
        Rewrite::Updated(updated) => match write_atomic(&meta_path, &updated) {
            Ok(()) => {
                tracing::debug!(work_dir = %work_dir, "Marked work directory as COMPLETED");
                StepOutcome::Applied
            }
            Err(e) => StepOutcome::Failed(format!("write metadata: {e}")),
        },
        Rewrite::AlreadyCompleted => StepOutcome::Skipped(SkipReason::AlreadyCompleted),
        Rewrite::UnexpectedFormat => StepOutcome::Skipped(SkipReason::UnexpectedFormat),
    }
}

enum Rewrite {
    Updated(String),
    AlreadyCompleted,
    UnexpectedFormat,
}

fn rewrite_completed(content: &str, now: DateTime<Utc>) -> Rewrite {
    // split('\n') + join preserves a trailing newline (the final empty
    // element survives the round trip).
    let lines: Vec<&str> = content.split('\n').collect();

    let mut status_idx = None;
    let mut completed_at_idx = None;
    let mut already_completed = false;

    for (i, line) in lines.iter().enumerate() {
        let line = line.trim_end();
        match field_value(line, STATUS_KEY) {
            Some(STATUS_ACTIVE) => status_idx = Some(i),
            Some(STATUS_COMPLETED) => already_completed = true,
            _ => {}
        }
        if field_value(line, COMPLETED_AT_KEY) == Some("null") {
            completed_at_idx = Some(i);
        }
    }

    if already_completed {
        return Rewrite::AlreadyCompleted;
    }

    match (status_idx, completed_at_idx) {
        (Some(s), Some(c)) => {
            let mut out: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
            out[s] = format!("{STATUS_KEY}: {STATUS_COMPLETED}");
            out[c] = format!("{COMPLETED_AT_KEY}: \"{}\"", iso_timestamp(now));
            Rewrite::Updated(out.join("\n"))
        }
        // One field in the expected state but not the other: leave the
        // file alone rather than break the status/completed_at pairing.
        _ => Rewrite::UnexpectedFormat,
    }
}

/// Returns the value of a top-level `key: value` line, if this is one.
fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?;
    let rest = rest.strip_prefix(':')?;
    Some(rest.trim())
}

/// A work directory name must be a single path component.
fn is_plain_dir_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const ACTIVE_META: &str = "title: Fix the flaky test\nstatus: \"ACTIVE\"\ncreated_at: \"2024-01-15T09:00:00.000Z\"\ncompleted_at: null\nitems: 3\n";

    fn setup() -> (TempDir, StorageConfig) {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        storage.ensure_dirs().unwrap();
        (temp, storage)
    }

    fn write_meta(storage: &StorageConfig, work_dir: &str, content: &str) {
        let path = storage.work_meta_file(work_dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 17, 45, 0).unwrap()
    }

    #[test]
    fn test_active_meta_is_completed() {
        let (_temp, storage) = setup();
        write_meta(&storage, "task", ACTIVE_META);

        let outcome = complete_work_dir(&storage, "task", now());
        assert_eq!(outcome, StepOutcome::Applied);

        let content = fs::read_to_string(storage.work_meta_file("task")).unwrap();
        assert!(content.contains("status: \"COMPLETED\""));
        assert!(content.contains("completed_at: \"2024-01-15T17:45:00.000Z\""));
        assert!(!content.contains("completed_at: null"));
    }

    #[test]
    fn test_unknown_lines_preserved_byte_for_byte() {
        let (_temp, storage) = setup();
        write_meta(&storage, "task", ACTIVE_META);

        complete_work_dir(&storage, "task", now());

        let content = fs::read_to_string(storage.work_meta_file("task")).unwrap();
        assert!(content.starts_with("title: Fix the flaky test\n"));
        assert!(content.contains("created_at: \"2024-01-15T09:00:00.000Z\""));
        assert!(content.contains("items: 3"));
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_missing_meta_skips() {
        let (_temp, storage) = setup();
        assert_eq!(
            complete_work_dir(&storage, "absent", now()),
            StepOutcome::Skipped(SkipReason::MissingMeta)
        );
    }

    #[test]
    fn test_already_completed_skips_without_change() {
        let (_temp, storage) = setup();
        let completed = "status: \"COMPLETED\"\ncompleted_at: \"2024-01-14T08:00:00.000Z\"\n";
        write_meta(&storage, "task", completed);

        let outcome = complete_work_dir(&storage, "task", now());
        assert_eq!(outcome, StepOutcome::Skipped(SkipReason::AlreadyCompleted));

        let content = fs::read_to_string(storage.work_meta_file("task")).unwrap();
        assert_eq!(content, completed);
    }

    #[test]
    fn test_foreign_status_value_skips_untouched() {
        let (_temp, storage) = setup();
        let paused = "status: \"PAUSED\"\ncompleted_at: null\n";
        write_meta(&storage, "task", paused);

        let outcome = complete_work_dir(&storage, "task", now());
        assert_eq!(outcome, StepOutcome::Skipped(SkipReason::UnexpectedFormat));
        assert_eq!(
            fs::read_to_string(storage.work_meta_file("task")).unwrap(),
            paused
        );
    }

    #[test]
    fn test_missing_completed_at_line_skips() {
        // Flipping status alone would break the pairing invariant.
        let (_temp, storage) = setup();
        write_meta(&storage, "task", "status: \"ACTIVE\"\n");

        assert_eq!(
            complete_work_dir(&storage, "task", now()),
            StepOutcome::Skipped(SkipReason::UnexpectedFormat)
        );
    }

    #[test]
    fn test_indented_fields_are_not_top_level() {
        let (_temp, storage) = setup();
        let nested = "outer:\n  status: \"ACTIVE\"\n  completed_at: null\n";
        write_meta(&storage, "task", nested);

        assert_eq!(
            complete_work_dir(&storage, "task", now()),
            StepOutcome::Skipped(SkipReason::UnexpectedFormat)
        );
        assert_eq!(
            fs::read_to_string(storage.work_meta_file("task")).unwrap(),
            nested
        );
    }

    #[test]
    fn test_prefixed_keys_do_not_match() {
        let (_temp, storage) = setup();
        let tricky =
            "status_note: \"ACTIVE\"\nstatus: \"ACTIVE\"\ncompleted_at: null\n";
        write_meta(&storage, "task", tricky);

        complete_work_dir(&storage, "task", now());

        let content = fs::read_to_string(storage.work_meta_file("task")).unwrap();
        assert!(content.contains("status_note: \"ACTIVE\""));
        assert!(content.contains("status: \"COMPLETED\""));
    }

    #[test]
    fn test_path_traversal_names_rejected() {
        let (_temp, storage) = setup();
        for name in ["../escape", "a/b", "", "..", "."] {
            assert_eq!(
                complete_work_dir(&storage, name, now()),
                StepOutcome::Skipped(SkipReason::InvalidWorkDir),
                "name {name:?} should be rejected"
            );
        }
    }
}
