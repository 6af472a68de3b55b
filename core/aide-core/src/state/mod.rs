//! Session work-state tracking.
//!
//! Records which work directory a host session is acting on, marks that
//! work complete when the session ends, and leaves behind a resume pointer.
//!
//! # Architecture
//!
//! Two roles cooperate through the shared state directory and never talk
//! to each other directly:
//!
//! ```text
//! Work Recorder → STATE/current-work-{id}.json → Finalizer → WORK/<dir>/META.yaml
//!   (external)        (+ legacy un-keyed slot)    (this module)   + STATE/resume-{id}.json
//! ```
//!
//! The recorder (an external hook) writes a current-work record when a
//! session starts tracked work. At session end, [`finalize_session`]
//! resolves that record, flips the work directory's metadata to
//! `COMPLETED`, writes session-keyed and legacy resume pointers, and
//! deletes the consumed record.
//!
//! # Concurrency
//!
//! Multiple host sessions share one state directory. There are no locks:
//! session-keyed file names are exclusive per session by construction, and
//! the single legacy slot is only trusted (or deleted) after its embedded
//! `session_id` is checked against the caller's. That check-then-act has a
//! window - a second session can overwrite the legacy file between our
//! read and delete - which is accepted: session boundaries are human-paced
//! and the keyed paths carry all new traffic.
//!
//! # Module Structure
//!
//! - [`resolver`]: finds the record belonging to a session (keyed first,
//!   legacy only on an id match)
//! - [`transition`]: flips `META.yaml` from ACTIVE to COMPLETED
//! - [`resume`]: persists the resume pointers
//! - [`cleanup`]: removes the consumed record
//! - [`finalize`]: orchestrates the above; infallible by contract
//! - [`types`]: record structs and per-step outcome types

pub mod cleanup;
pub mod finalize;
pub mod resolver;
pub mod resume;
pub mod transition;
pub mod types;

pub use finalize::{finalize_session, FinalizeReport};
pub use resolver::{resolve_record, RecordSource, ResolvedRecord};
pub use types::{CurrentWorkRecord, ResumeRecord, SkipReason, StepOutcome};
