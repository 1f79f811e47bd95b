//! Dispatch policies.

use schedsim_core::{Task, Tick};
use serde::{Deserialize, Serialize};

/// The dispatch policy for a run.
///
/// This is the single point of policy-specific behavior: given the
/// ready set for a tick, [`Policy::select`] picks the task to run. The
/// surrounding loop is identical for both variants, which is what makes
/// both preemptive: the choice is re-evaluated from scratch every
/// tick instead of committing a task for its full burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Policy {
    /// Earliest Deadline First: dynamic priority by nearest absolute
    /// deadline.
    EarliestDeadlineFirst,

    /// Rate Monotonic: static priority by shortest period (deadline
    /// standing in for tasks without one).
    RateMonotonic,
}

impl Policy {
    /// Pick the task to dispatch this tick, or `None` if nothing is
    /// ready.
    ///
    /// Both policies order by `(priority key, arrival, id)` and take
    /// the minimum, so ties fall back to the earliest arrival and then
    /// to the smallest id. Ids are unique, which makes the selection
    /// total and the trace reproducible. A linear scan is plenty at
    /// simulation scale.
    pub fn select<'a>(&self, ready: &[&'a Task]) -> Option<&'a Task> {
        ready
            .iter()
            .copied()
            .min_by(|a, b| self.key(a).cmp(&self.key(b)))
    }

    fn key<'a>(&self, task: &'a Task) -> (Tick, Tick, &'a schedsim_core::TaskId) {
        let priority = match self {
            Policy::EarliestDeadlineFirst => task.spec.deadline,
            Policy::RateMonotonic => task.rms_priority(),
        };
        (priority, task.spec.arrival, task.id())
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::EarliestDeadlineFirst => write!(f, "EDF"),
            Policy::RateMonotonic => write!(f, "RMS"),
        }
    }
}
