//! # aide-core
//!
//! Core library for aide: session work-state tracking and operator tooling
//! for a host AI assistant whose configuration tree lives under `~/.claude`.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Every operation is a
//!   short-lived local file read/write/delete.
//! - **Filesystem-coordinated**: Multiple host sessions share one state
//!   directory; session-keyed paths are exclusive per session by
//!   construction, and the single legacy slot is validated against the
//!   embedded session id before it is trusted.
//! - **Graceful degradation**: Missing or malformed records mean "nothing
//!   to do", not errors. The session finalizer is infallible by contract -
//!   it reports per-step outcomes instead of propagating failures.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aide_core::state::finalize_session;
//! use aide_core::storage::StorageConfig;
//!
//! let storage = StorageConfig::default();
//! let report = finalize_session(&storage, "abc123");
//! assert!(report.cleanup.applied());
//! ```

pub mod error;
pub mod input;
pub mod setup;
pub mod state;
pub mod storage;
pub mod validation;

pub use error::{AideError, Result};
pub use input::HookInput;
pub use state::{finalize_session, FinalizeReport, SkipReason, StepOutcome};
pub use storage::StorageConfig;
