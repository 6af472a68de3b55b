//! Error types for aide-core operations.
//!
//! The session finalizer never surfaces these (per its non-blocking
//! contract it converts failures into per-step outcomes); the installer
//! and validator propagate them normally.

use std::path::PathBuf;

/// All errors that can occur in aide-core operations.
#[derive(Debug, thiserror::Error)]
pub enum AideError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Settings file malformed: {path}: {details}")]
    SettingsMalformed { path: PathBuf, details: String },

    #[error("Packs directory not found: {0}")]
    PacksDirNotFound(PathBuf),

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using AideError.
pub type Result<T> = std::result::Result<T, AideError>;
