//! Utilization-based schedulability analysis.
//!
//! Advisory helpers over task definitions; nothing here gates a run.
//! A task's utilization is `burst / period` (deadline standing in for a
//! missing period, as in dispatch). Under Rate Monotonic scheduling,
//! Liu & Layland (1973) guarantee a set of `n` independent tasks is
//! schedulable when total utilization stays within `n * (2^(1/n) - 1)`,
//! a bound that starts at 1.0 for a single task and tightens toward
//! `ln 2` as `n` grows. Between the bound and 1.0 the set may or may
//! not be schedulable; simulate to find out. EDF only needs `U <= 1`.

use schedsim_core::TaskSpec;

/// Total utilization of a task set: the sum of `burst / period`.
///
/// Tasks with a zero period contribute nothing (the validation layer
/// rejects them before a run anyway).
pub fn total_utilization(specs: &[TaskSpec]) -> f64 {
    specs
        .iter()
        .map(|s| {
            let period = s.period.unwrap_or(s.deadline);
            if period == 0 {
                0.0
            } else {
                s.burst as f64 / period as f64
            }
        })
        .sum()
}

/// The Liu & Layland utilization bound for `n` tasks:
/// `n * (2^(1/n) - 1)`. Returns 0.0 for an empty set.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    n * (2.0_f64.powf(1.0 / n) - 1.0)
}

/// Whether RMS provably schedules the set (utilization within the
/// Liu & Layland bound). `false` means "not guaranteed", not
/// "infeasible".
pub fn rms_guaranteed(specs: &[TaskSpec]) -> bool {
    total_utilization(specs) <= liu_layland_bound(specs.len())
}

/// Whether EDF can feasibly schedule the set on one CPU (`U <= 1`).
pub fn edf_feasible(specs: &[TaskSpec]) -> bool {
    total_utilization(specs) <= 1.0
}
