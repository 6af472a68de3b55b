//! Finds the current-work record belonging to a session.
//!
//! Resolution order:
//!
//! 1. The session-keyed path. If present and parseable it is trusted
//!    unconditionally - the file name already encodes the session.
//! 2. The legacy un-keyed path, honored only when its embedded
//!    `session_id` equals the requested one. Anything else belongs to a
//!    different session and is left alone.
//!
//! Malformed content is treated as absence, never as a hard failure: this
//! runs inside the host's shutdown sequence and must not abort it.

use std::io;
use std::path::{Path, PathBuf};

use fs_err as fs;

use crate::storage::StorageConfig;

use super::types::CurrentWorkRecord;

/// Where a resolved record was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    SessionKeyed,
    Legacy,
}

/// A current-work record together with the path it was read from.
///
/// The path is what cleanup deletes later; keeping it here guarantees the
/// delete targets exactly the file that was validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    pub record: CurrentWorkRecord,
    pub path: PathBuf,
    pub source: RecordSource,
}

/// Resolves the current-work record for `session_id`, if any.
///
/// No side effects.
pub fn resolve_record(storage: &StorageConfig, session_id: &str) -> Option<ResolvedRecord> {
    let keyed = storage.current_work_file(session_id);
    if let Some(record) = read_record(&keyed) {
        return Some(ResolvedRecord {
            record,
            path: keyed,
            source: RecordSource::SessionKeyed,
        });
    }

    let legacy = storage.legacy_current_work_file();
    let record = read_record(&legacy)?;
    if record.session_id == session_id {
        Some(ResolvedRecord {
            record,
            path: legacy,
            source: RecordSource::Legacy,
        })
    } else {
        tracing::debug!(
            session = %session_id,
            legacy_session = %record.session_id,
            "Legacy current-work record belongs to a different session"
        );
        None
    }
}

fn read_record(path: &Path) -> Option<CurrentWorkRecord> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Unreadable current-work record, treating as absent");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Malformed current-work record, treating as absent");
            None
        }
    }
}
