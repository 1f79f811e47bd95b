//! Error taxonomy for the simulator.

use crate::id::TaskId;

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors that can abort a simulation run.
///
/// Two families: malformed input (`InvalidTask`, `DuplicateTaskId`),
/// rejected once at run start and fatal to that run; and internal
/// invariant violations (`InvalidState`), which indicate a bug in the
/// engine rather than in the caller's task set. Deadline misses are not
/// errors: they are a recorded outcome of the simulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// A task definition failed validation.
    #[error("invalid task {id}: {field} = {value} ({reason})")]
    InvalidTask {
        /// Offending task.
        id: TaskId,
        /// Name of the rejected field.
        field: &'static str,
        /// The rejected value.
        value: u64,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Two task definitions share an id.
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(TaskId),

    /// An internal invariant was violated mid-run.
    #[error("invalid state for task {id}: {detail}")]
    InvalidState {
        /// Task whose state was inconsistent.
        id: TaskId,
        /// What was violated.
        detail: &'static str,
    },
}
