//! The tick loop.

use std::collections::BTreeMap;

use schedsim_core::{
    ExecutionRecord, Result, RunResult, RunSummary, SimError, TaskOutcome, TaskSpec, Tick,
};

use crate::policy::Policy;
use crate::ready::ReadySet;

/// Multiplier applied to the total burst when deriving the default tick
/// limit. Any factor above 1 exceeds the worst-case single-CPU
/// completion horizon.
const TICK_LIMIT_SAFETY_FACTOR: Tick = 2;

/// A configured simulation: one policy, an optional tick ceiling.
///
/// `run` is a pure step function driven to completion in one call:
/// single-threaded, no I/O, deterministic given its inputs. Every call
/// builds fresh task state from the supplied definitions, so comparing
/// policies over the same definitions is just two calls; no state
/// leaks between runs.
#[derive(Debug, Clone)]
pub struct Simulation {
    policy: Policy,
    tick_limit: Option<Tick>,
}

impl Simulation {
    /// A simulation under the given policy with the default tick limit.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            tick_limit: None,
        }
    }

    /// Override the tick ceiling.
    ///
    /// The ceiling exists so a task set that can never finish (total
    /// burst beyond the horizon) still terminates; hitting it is not an
    /// error, and tasks left incomplete are reported as missed.
    pub fn with_tick_limit(mut self, tick_limit: Tick) -> Self {
        self.tick_limit = Some(tick_limit);
        self
    }

    /// The active policy.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Simulate the given task set to completion.
    ///
    /// Validates every definition up front (never mid-run), then per
    /// tick: admit arrivals, let the policy pick from the ready set,
    /// execute the pick for one time unit, record completions and
    /// deadline expiries, and append one trace record. Stops when all
    /// tasks are done or the tick limit is reached.
    pub fn run(&self, specs: &[TaskSpec]) -> Result<RunResult> {
        validate(specs)?;
        let mut tasks = ReadySet::new(specs)?;
        let tick_limit = self.tick_limit.unwrap_or_else(|| default_tick_limit(specs));

        tracing::debug!(
            "starting {} run: {} tasks, tick limit {}",
            self.policy,
            specs.len(),
            tick_limit
        );

        let mut trace = Vec::new();
        let mut tick: Tick = 0;

        while !tasks.all_complete() && tick < tick_limit {
            let ready = tasks.ready(tick);
            let ready_ids: Vec<_> = ready.iter().map(|t| t.id().clone()).collect();
            let running = self.policy.select(&ready).map(|t| t.id().clone());

            if let Some(id) = &running {
                let task = tasks.get_mut(id).ok_or_else(|| SimError::InvalidState {
                    id: id.clone(),
                    detail: "policy selected a task not in the run",
                })?;
                task.advance()?;
                if task.is_complete() {
                    let completed_at = tick + 1;
                    task.completion_time = Some(completed_at);
                    task.deadline_missed = completed_at > task.spec.deadline;
                    tracing::debug!(
                        "tick {}: {} completed at {} (deadline {}, missed: {})",
                        tick,
                        id,
                        completed_at,
                        task.spec.deadline,
                        task.deadline_missed
                    );
                }
            } else {
                tracing::debug!("tick {}: idle", tick);
            }

            // Deadline expiry: anything still unfinished when its
            // deadline tick arrives has missed, whether or not it ever
            // completes later.
            for task in tasks.tasks_mut() {
                if task.spec.deadline == tick + 1 && !task.is_complete() {
                    task.deadline_missed = true;
                    tracing::debug!("tick {}: {} missed its deadline", tick, task.id());
                }
            }

            trace.push(ExecutionRecord {
                tick,
                running,
                ready: ready_ids,
            });
            tick += 1;
        }

        // Tasks cut off by the tick limit are missed and incomplete.
        for task in tasks.tasks_mut() {
            if !task.is_complete() {
                task.deadline_missed = true;
            }
        }

        let outcomes: BTreeMap<_, _> = tasks
            .tasks()
            .map(|t| {
                (
                    t.id().clone(),
                    TaskOutcome {
                        completion_time: t.completion_time,
                        deadline_missed: t.deadline_missed,
                    },
                )
            })
            .collect();
        let missed_deadlines = outcomes.values().filter(|o| o.deadline_missed).count();

        tracing::info!(
            "{} run finished: {} ticks, {} of {} deadlines missed",
            self.policy,
            tick,
            missed_deadlines,
            specs.len()
        );

        Ok(RunResult::new(
            trace,
            RunSummary {
                missed_deadlines,
                total_ticks: tick,
                outcomes,
            },
        ))
    }
}

/// Default tick ceiling: twice the total burst, floored at the latest
/// deadline so late-arriving tasks stay inside the horizon.
fn default_tick_limit(specs: &[TaskSpec]) -> Tick {
    let total_burst: Tick = specs.iter().map(|s| s.burst).sum();
    let max_deadline = specs.iter().map(|s| s.deadline).max().unwrap_or(0);
    (total_burst.saturating_mul(TICK_LIMIT_SAFETY_FACTOR)).max(max_deadline)
}

/// Field-level validation, run once before the loop starts.
fn validate(specs: &[TaskSpec]) -> Result<()> {
    for spec in specs {
        if spec.burst == 0 {
            return Err(SimError::InvalidTask {
                id: spec.id.clone(),
                field: "burst",
                value: spec.burst,
                reason: "must be positive",
            });
        }
        if spec.deadline <= spec.arrival {
            return Err(SimError::InvalidTask {
                id: spec.id.clone(),
                field: "deadline",
                value: spec.deadline,
                reason: "must be after arrival",
            });
        }
        if spec.period == Some(0) {
            return Err(SimError::InvalidTask {
                id: spec.id.clone(),
                field: "period",
                value: 0,
                reason: "must be positive",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedsim_core::TaskId;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env(),
            )
            .with_test_writer()
            .try_init();
    }

    fn running_ids(result: &RunResult) -> Vec<Option<&str>> {
        result
            .trace()
            .iter()
            .map(|r| r.running.as_ref().map(TaskId::as_str))
            .collect()
    }

    #[test]
    fn single_task_runs_to_completion() {
        // Scenario: one task, arrival 0, burst 3, deadline 5.
        init_tracing();
        let specs = vec![TaskSpec::new("T1", 0, 3, 5)];
        for policy in [Policy::EarliestDeadlineFirst, Policy::RateMonotonic] {
            let result = Simulation::new(policy).run(&specs).unwrap();
            assert_eq!(
                running_ids(&result),
                vec![Some("T1"), Some("T1"), Some("T1")]
            );
            let outcome = result.outcome(&TaskId::from("T1")).unwrap();
            assert_eq!(outcome.completion_time, Some(3));
            assert!(!outcome.deadline_missed);
            assert_eq!(result.summary().missed_deadlines, 0);
            assert_eq!(result.summary().total_ticks, 3);
        }
    }

    #[test]
    fn edf_prefers_nearer_deadline_and_records_miss() {
        // T2 (deadline 3) preempts the queue ahead of T1 (deadline 4);
        // T1 finishes at tick 6 and misses.
        let specs = vec![
            TaskSpec::new("T1", 0, 4, 4).with_period(4),
            TaskSpec::new("T2", 0, 2, 3).with_period(3),
        ];
        let result = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap();

        assert_eq!(
            running_ids(&result),
            vec![
                Some("T2"),
                Some("T2"),
                Some("T1"),
                Some("T1"),
                Some("T1"),
                Some("T1"),
            ]
        );

        let t2 = result.outcome(&TaskId::from("T2")).unwrap();
        assert_eq!(t2.completion_time, Some(2));
        assert!(!t2.deadline_missed);

        let t1 = result.outcome(&TaskId::from("T1")).unwrap();
        assert_eq!(t1.completion_time, Some(6));
        assert!(t1.deadline_missed);
        assert_eq!(result.summary().missed_deadlines, 1);
    }

    #[test]
    fn rms_matches_edf_when_period_order_matches_deadline_order() {
        let specs = vec![
            TaskSpec::new("T1", 0, 4, 4).with_period(4),
            TaskSpec::new("T2", 0, 2, 3).with_period(3),
        ];
        let edf = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap();
        let rms = Simulation::new(Policy::RateMonotonic).run(&specs).unwrap();
        assert_eq!(edf.trace(), rms.trace());
    }

    #[test]
    fn rms_diverges_from_edf_when_orders_conflict() {
        // EDF: T2 first (deadline 3 < 10). RMS: T1 first (period 2 < 8).
        let specs = vec![
            TaskSpec::new("T1", 0, 2, 10).with_period(2),
            TaskSpec::new("T2", 0, 2, 3).with_period(8),
        ];
        let edf = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap();
        let rms = Simulation::new(Policy::RateMonotonic).run(&specs).unwrap();
        assert_eq!(edf.trace()[0].running, Some(TaskId::from("T2")));
        assert_eq!(rms.trace()[0].running, Some(TaskId::from("T1")));
    }

    #[test]
    fn idle_ticks_are_recorded_with_no_running_task() {
        let specs = vec![TaskSpec::new("T1", 2, 1, 5)];
        let result = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap();
        assert_eq!(running_ids(&result), vec![None, None, Some("T1")]);
        assert!(result.trace()[0].ready.is_empty());
    }

    #[test]
    fn zero_slack_task_exactly_meets_its_deadline() {
        // arrival == deadline - burst: completes exactly at the deadline.
        let specs = vec![TaskSpec::new("T1", 2, 3, 5)];
        let result = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap();
        let outcome = result.outcome(&TaskId::from("T1")).unwrap();
        assert_eq!(outcome.completion_time, Some(5));
        assert!(!outcome.deadline_missed);
    }

    #[test]
    fn tick_limit_bounds_the_run_and_marks_survivors_missed() {
        let specs = vec![TaskSpec::new("T1", 0, 100, 150)];
        let result = Simulation::new(Policy::RateMonotonic)
            .with_tick_limit(10)
            .run(&specs)
            .unwrap();
        assert_eq!(result.summary().total_ticks, 10);
        assert_eq!(result.trace().len(), 10);
        let outcome = result.outcome(&TaskId::from("T1")).unwrap();
        assert_eq!(outcome.completion_time, None);
        assert!(outcome.deadline_missed);
        assert_eq!(result.summary().missed_deadlines, 1);
    }

    #[test]
    fn miss_is_marked_at_deadline_expiry_before_completion() {
        // T1's deadline passes at tick 3 while it is still waiting
        // behind T2; the miss must be visible even before T1 finishes.
        let specs = vec![
            TaskSpec::new("T1", 0, 2, 3),
            TaskSpec::new("T2", 0, 3, 2),
        ];
        let result = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap();
        // T2 (deadline 2) runs first and misses too; both end up missed.
        assert_eq!(result.summary().missed_deadlines, 2);
    }

    #[test]
    fn rejects_zero_burst() {
        let specs = vec![TaskSpec::new("T1", 0, 0, 5)];
        let err = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap_err();
        assert_eq!(
            err,
            SimError::InvalidTask {
                id: TaskId::from("T1"),
                field: "burst",
                value: 0,
                reason: "must be positive",
            }
        );
    }

    #[test]
    fn rejects_deadline_at_or_before_arrival() {
        let specs = vec![TaskSpec::new("T1", 5, 1, 5)];
        let err = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidTask {
                field: "deadline",
                ..
            }
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let specs = vec![
            TaskSpec::new("T1", 0, 1, 5),
            TaskSpec::new("T1", 0, 2, 9),
        ];
        let err = Simulation::new(Policy::RateMonotonic)
            .run(&specs)
            .unwrap_err();
        assert_eq!(err, SimError::DuplicateTaskId(TaskId::from("T1")));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let specs = vec![
            TaskSpec::new("T1", 0, 3, 9).with_period(6),
            TaskSpec::new("T2", 1, 2, 5).with_period(5),
            TaskSpec::new("T3", 2, 4, 14).with_period(9),
        ];
        let sim = Simulation::new(Policy::EarliestDeadlineFirst);
        let first = sim.run(&specs).unwrap();
        let second = sim.run(&specs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn trace_is_contiguous_and_single_cpu() {
        let specs = vec![
            TaskSpec::new("T1", 0, 3, 9),
            TaskSpec::new("T2", 4, 2, 12),
        ];
        let result = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap();
        for (i, record) in result.trace().iter().enumerate() {
            assert_eq!(record.tick, i as Tick);
            // Idle ticks coincide with an empty ready set.
            if record.running.is_none() {
                assert!(record.ready.is_empty());
            }
        }
        assert_eq!(result.trace().len() as Tick, result.summary().total_ticks);
    }

    #[test]
    fn dispatched_task_always_has_the_minimum_key_in_the_ready_set() {
        let specs = vec![
            TaskSpec::new("T1", 0, 3, 12).with_period(7),
            TaskSpec::new("T2", 1, 2, 6).with_period(9),
            TaskSpec::new("T3", 3, 2, 8).with_period(4),
        ];
        let result = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap();
        let deadline_of = |id: &TaskId| specs.iter().find(|s| &s.id == id).unwrap().deadline;
        for record in result.trace() {
            if let Some(running) = &record.running {
                let min = record.ready.iter().map(&deadline_of).min().unwrap();
                assert_eq!(deadline_of(running), min);
            }
        }
    }

    #[test]
    fn dispatched_task_always_has_the_minimum_period_under_rms() {
        let specs = vec![
            TaskSpec::new("T1", 0, 3, 12).with_period(7),
            TaskSpec::new("T2", 1, 2, 6).with_period(9),
            TaskSpec::new("T3", 3, 2, 8), // period falls back to deadline
        ];
        let result = Simulation::new(Policy::RateMonotonic).run(&specs).unwrap();
        let period_of = |id: &TaskId| {
            let spec = specs.iter().find(|s| &s.id == id).unwrap();
            spec.period.unwrap_or(spec.deadline)
        };
        for record in result.trace() {
            if let Some(running) = &record.running {
                let min = record.ready.iter().map(&period_of).min().unwrap();
                assert_eq!(period_of(running), min);
            }
        }
    }

    #[test]
    fn run_result_serializes_for_front_ends() {
        let specs = vec![
            TaskSpec::new("T1", 0, 2, 3),
            TaskSpec::new("T2", 1, 1, 6),
        ];
        let result = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&specs)
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();

        // One trace entry per tick, contiguous from 0, renderable as-is.
        let trace = json["trace"].as_array().unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace[0]["tick"], 0);
        assert_eq!(trace[0]["running"], "T1");
        assert_eq!(trace[2]["running"], "T2");

        // Miss report derivable purely from the outcomes map.
        assert_eq!(json["summary"]["missed_deadlines"], 0);
        assert_eq!(
            json["summary"]["outcomes"]["T1"]["completion_time"],
            2
        );
        assert_eq!(
            json["summary"]["outcomes"]["T2"]["deadline_missed"],
            false
        );
    }

    #[test]
    fn burst_ticks_in_trace_match_the_definition() {
        let specs = vec![
            TaskSpec::new("T1", 0, 3, 20),
            TaskSpec::new("T2", 0, 4, 21),
        ];
        let result = Simulation::new(Policy::RateMonotonic).run(&specs).unwrap();
        for spec in &specs {
            let dispatched = result
                .trace()
                .iter()
                .filter(|r| r.running.as_ref() == Some(&spec.id))
                .count() as Tick;
            assert_eq!(dispatched, spec.burst);
        }
    }

    #[test]
    fn empty_task_set_yields_an_empty_run() {
        let result = Simulation::new(Policy::EarliestDeadlineFirst)
            .run(&[])
            .unwrap();
        assert!(result.trace().is_empty());
        assert_eq!(result.summary().total_ticks, 0);
        assert_eq!(result.summary().missed_deadlines, 0);
    }

    #[test]
    fn default_tick_limit_covers_the_horizon() {
        let specs = vec![
            TaskSpec::new("T1", 0, 3, 40),
            TaskSpec::new("T2", 0, 2, 8),
        ];
        assert_eq!(default_tick_limit(&specs), 40);
        let specs = vec![TaskSpec::new("T1", 0, 30, 8)];
        assert_eq!(default_tick_limit(&specs), 60);
    }
}
