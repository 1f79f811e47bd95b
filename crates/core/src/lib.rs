//! Schedsim core data models.
//!
//! This crate defines the data structures shared between the scheduling
//! engine and its consumers: task definitions and runtime state, the
//! per-tick execution trace, run summaries, and the error taxonomy.

#![warn(missing_docs)]

// Core identity
mod id;

// Task definition and runtime state
mod task;

// Execution trace and run results
mod trace;

// Error taxonomy
mod error;

// Re-exports
pub use id::TaskId;

pub use task::{Task, TaskSpec};

pub use trace::{ExecutionRecord, RunResult, RunSummary, TaskOutcome};

pub use error::{Result, SimError};

/// Simulated time: one tick is one discrete unit of CPU time.
pub type Tick = u64;
