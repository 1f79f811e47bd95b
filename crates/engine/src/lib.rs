//! Schedsim scheduling engine.
//!
//! Simulates preemptive real-time dispatch over a discrete clock under
//! two policies: Earliest Deadline First (dynamic priority by nearest
//! absolute deadline) and Rate Monotonic (static priority by shortest
//! period). Each tick the engine admits arrivals, dispatches the
//! highest-priority ready task for one time unit, detects deadline
//! misses, and appends one record to the run's execution trace.

#![warn(missing_docs)]

// Dispatch policies
mod policy;

// Ready-set management
mod ready;

// The tick loop
mod engine;

// Utilization-based schedulability analysis
pub mod analysis;

pub use engine::Simulation;
pub use policy::Policy;
pub use ready::ReadySet;
