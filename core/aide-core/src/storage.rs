//! Storage configuration and path management for aide.
//!
//! This module provides a centralized `StorageConfig` struct that manages
//! every path the tools touch. This abstraction enables:
//!
//! - Easy path changes without hunting through code
//! - Testability via dependency injection (inject temp roots)
//! - Env var overrides (`AIDE_DIR`)
//!
//! ## Design Principles
//!
//! - **Single source of truth**: All path derivations centralized here,
//!   including the session-keyed and legacy state file names
//! - **Testable**: `StorageConfig::with_root()` enables test injection

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Environment variable overriding the assistant root directory.
pub const ROOT_ENV_VAR: &str = "AIDE_DIR";

/// Central configuration for all aide storage paths.
///
/// Production code uses `StorageConfig::default()` which points to
/// `$AIDE_DIR` or `~/.claude`. Tests use `StorageConfig::with_root(temp)`
/// for isolation.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory of the host assistant tree (default: ~/.claude)
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::discover().expect("Could not find home directory")
    }
}

impl StorageConfig {
    /// Resolves the assistant root without panicking.
    ///
    /// Used by the hook binary, which must degrade gracefully rather than
    /// abort the host's shutdown sequence when no home directory exists.
    pub fn discover() -> Option<Self> {
        if let Some(dir) = std::env::var_os(ROOT_ENV_VAR).filter(|d| !d.is_empty()) {
            return Some(Self {
                root: PathBuf::from(dir),
            });
        }
        dirs::home_dir().map(|home| Self {
            root: home.join(".claude"),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the assistant root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session State Paths
    // ─────────────────────────────────────────────────────────────────────

    /// Path to the memory tree holding session state and tracked work.
    pub fn memory_dir(&self) -> PathBuf {
        self.root.join("MEMORY")
    }

    /// Path to the shared state directory.
    pub fn state_dir(&self) -> PathBuf {
        self.memory_dir().join("STATE")
    }

    /// Path to the root under which work directories live.
    pub fn work_root(&self) -> PathBuf {
        self.memory_dir().join("WORK")
    }

    /// Session-keyed current-work record.
    /// Example: `MEMORY/STATE/current-work-abc123.json`
    pub fn current_work_file(&self, session_id: &str) -> PathBuf {
        self.state_dir()
            .join(format!("current-work-{session_id}.json"))
    }

    /// The single legacy (un-keyed) current-work record, shared by all
    /// sessions for backward compatibility with pre-concurrency layouts.
    pub fn legacy_current_work_file(&self) -> PathBuf {
        self.state_dir().join("current-work.json")
    }

    /// Session-keyed resume pointer.
    /// Example: `MEMORY/STATE/resume-abc123.json`
    pub fn resume_file(&self, session_id: &str) -> PathBuf {
        self.state_dir().join(format!("resume-{session_id}.json"))
    }

    /// The legacy "most recently ended session" resume pointer.
    pub fn legacy_resume_file(&self) -> PathBuf {
        self.state_dir().join("last-resume.json")
    }

    /// Metadata file inside a named work directory.
    /// Example: `MEMORY/WORK/2024-01-15-task/META.yaml`
    pub fn work_meta_file(&self, work_dir: &str) -> PathBuf {
        self.work_root().join(work_dir).join("META.yaml")
    }

    // ─────────────────────────────────────────────────────────────────────
    // Host Configuration Paths
    // ─────────────────────────────────────────────────────────────────────

    /// Path to the host application's settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    /// Path to the host application's local settings overrides.
    pub fn local_settings_file(&self) -> PathBuf {
        self.root.join("settings.local.json")
    }

    /// Path to the environment file written by the installer.
    pub fn env_file(&self) -> PathBuf {
        self.root.join(".env")
    }

    /// Path to the directory receiving hook log files.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    // ─────────────────────────────────────────────────────────────────────
    // Directory Creation
    // ─────────────────────────────────────────────────────────────────────

    /// Ensures the state tree exists (state dir, work root, logs).
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs_err::create_dir_all(self.state_dir())?;
        fs_err::create_dir_all(self.work_root())?;
        fs_err::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

/// Writes `contents` to `path` atomically (temp file in the destination
/// directory + rename), so concurrent readers never observe a partial file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::other(format!("{} has no parent directory", path.display()))
    })?;
    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents.as_bytes())?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_with_root_sets_custom_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/test-aide"));
        assert_eq!(config.root(), Path::new("/tmp/test-aide"));
    }

    #[test]
    fn test_state_dir_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/aide"));
        assert_eq!(config.state_dir(), PathBuf::from("/tmp/aide/MEMORY/STATE"));
    }

    #[test]
    fn test_work_root_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/aide"));
        assert_eq!(config.work_root(), PathBuf::from("/tmp/aide/MEMORY/WORK"));
    }

    #[test]
    fn test_current_work_file_is_session_keyed() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/aide"));
        assert_eq!(
            config.current_work_file("abc123"),
            PathBuf::from("/tmp/aide/MEMORY/STATE/current-work-abc123.json")
        );
    }

    #[test]
    fn test_legacy_current_work_file_is_unkeyed() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/aide"));
        assert_eq!(
            config.legacy_current_work_file(),
            PathBuf::from("/tmp/aide/MEMORY/STATE/current-work.json")
        );
    }

    #[test]
    fn test_resume_file_paths() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/aide"));
        assert_eq!(
            config.resume_file("abc123"),
            PathBuf::from("/tmp/aide/MEMORY/STATE/resume-abc123.json")
        );
        assert_eq!(
            config.legacy_resume_file(),
            PathBuf::from("/tmp/aide/MEMORY/STATE/last-resume.json")
        );
    }

    #[test]
    fn test_work_meta_file_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/aide"));
        assert_eq!(
            config.work_meta_file("2024-01-15-task"),
            PathBuf::from("/tmp/aide/MEMORY/WORK/2024-01-15-task/META.yaml")
        );
    }

    #[test]
    fn test_settings_file_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/aide"));
        assert_eq!(
            config.settings_file(),
            PathBuf::from("/tmp/aide/settings.json")
        );
    }

    #[test]
    fn test_ensure_dirs_creates_structure() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig::with_root(temp.path().to_path_buf());

        config.ensure_dirs().unwrap();

        assert!(config.state_dir().exists());
        assert!(config.work_root().exists());
        assert!(config.logs_dir().exists());
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");

        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();

        assert_eq!(fs_err::read_to_string(&path).unwrap(), "second");
    }
}
