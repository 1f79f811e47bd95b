//! Execution trace and run results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::TaskId;
use crate::Tick;

/// What happened during one simulated tick.
///
/// The engine appends exactly one record per tick, so a trace is
/// contiguous from tick 0 with no gaps and renderers may index it
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// The tick this record describes.
    pub tick: Tick,

    /// Task dispatched this tick, or `None` for an idle tick.
    pub running: Option<TaskId>,

    /// Tasks that were ready this tick, in ascending id order.
    pub ready: Vec<TaskId>,
}

/// Final outcome of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Tick at which the task completed; `None` if it never did.
    pub completion_time: Option<Tick>,

    /// Whether the task missed its deadline (including by never
    /// completing before the tick limit).
    pub deadline_missed: bool,
}

/// Aggregate statistics for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of tasks that missed their deadline.
    pub missed_deadlines: usize,

    /// Number of simulated ticks, equal to the trace length.
    pub total_ticks: Tick,

    /// Per-task outcomes, keyed by id.
    pub outcomes: BTreeMap<TaskId, TaskOutcome>,
}

/// Everything a run produced: the ordered trace plus its summary.
///
/// Immutable once built; front ends consume it read-only. A Gantt
/// rendering is derivable purely from [`RunResult::trace`] and a
/// missed-deadline report purely from the summary's outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    trace: Vec<ExecutionRecord>,
    summary: RunSummary,
}

impl RunResult {
    /// Assemble a result from the engine's trace and summary.
    pub fn new(trace: Vec<ExecutionRecord>, summary: RunSummary) -> Self {
        Self { trace, summary }
    }

    /// The ordered per-tick trace.
    pub fn trace(&self) -> &[ExecutionRecord] {
        &self.trace
    }

    /// The run's aggregate statistics.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// The outcome of one task, if it was part of the run.
    pub fn outcome(&self, id: &TaskId) -> Option<&TaskOutcome> {
        self.summary.outcomes.get(id)
    }
}
