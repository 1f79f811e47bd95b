//! Task model - the unit of schedulable work.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::id::TaskId;
use crate::Tick;

/// An immutable task definition, as supplied by the caller.
///
/// `deadline` is an absolute tick, not relative to arrival. `period` is
/// optional; when absent, RMS falls back to `deadline` as the static
/// priority key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Unique identifier, never reused.
    pub id: TaskId,

    /// Tick at which the task becomes eligible to run.
    pub arrival: Tick,

    /// Total CPU ticks required.
    pub burst: Tick,

    /// Absolute tick by which execution must finish.
    pub deadline: Tick,

    /// Period, the RMS priority key. Defaults to `deadline` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Tick>,
}

impl TaskSpec {
    /// Build a definition without a period.
    pub fn new(id: impl Into<TaskId>, arrival: Tick, burst: Tick, deadline: Tick) -> Self {
        Self {
            id: id.into(),
            arrival,
            burst,
            deadline,
            period: None,
        }
    }

    /// Attach a period.
    pub fn with_period(mut self, period: Tick) -> Self {
        self.period = Some(period);
        self
    }
}

/// Runtime state of a task during one simulation run.
///
/// Built by the engine from a [`TaskSpec`]; the definition never changes,
/// the bookkeeping fields do. The only mutation path for execution
/// progress is [`Task::advance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// The immutable definition this state was built from.
    pub spec: TaskSpec,

    /// CPU ticks still required; starts at `spec.burst`, never increases.
    pub remaining: Tick,

    /// Tick at which `remaining` reached 0, set once.
    pub completion_time: Option<Tick>,

    /// True once the task is known to have missed its deadline.
    pub deadline_missed: bool,
}

impl Task {
    /// Fresh runtime state for one run.
    pub fn from_spec(spec: TaskSpec) -> Self {
        let remaining = spec.burst;
        Self {
            spec,
            remaining,
            completion_time: None,
            deadline_missed: false,
        }
    }

    /// The task's id.
    pub fn id(&self) -> &TaskId {
        &self.spec.id
    }

    /// Whether the task has finished all its work.
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Static RMS priority key: the period, or the deadline when no
    /// period was declared.
    pub fn rms_priority(&self) -> Tick {
        self.spec.period.unwrap_or(self.spec.deadline)
    }

    /// Execute one tick of this task.
    ///
    /// Decrements `remaining` by exactly 1. A completed task must never
    /// be advanced again; that indicates a ready-set bug, reported as
    /// [`SimError::InvalidState`].
    pub fn advance(&mut self) -> Result<()> {
        if self.remaining == 0 {
            return Err(SimError::InvalidState {
                id: self.spec.id.clone(),
                detail: "advance() called on a completed task",
            });
        }
        self.remaining -= 1;
        Ok(())
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.spec.id == other.spec.id
    }
}

impl Eq for Task {}
