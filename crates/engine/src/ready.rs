//! Ready-set management.

use std::collections::BTreeMap;

use schedsim_core::{Result, SimError, Task, TaskId, TaskSpec, Tick};

/// Owns one run's task state and answers "who is ready at tick t?".
///
/// Tasks live in a `BTreeMap` keyed by id, so every enumeration is in
/// ascending id order, the stable order the policy tie-breaks rely
/// on. A task is ready once `arrival <= tick` and stops being admitted
/// the moment its remaining work reaches 0; a completed task is never
/// handed to the policy again.
#[derive(Debug)]
pub struct ReadySet {
    tasks: BTreeMap<TaskId, Task>,
}

impl ReadySet {
    /// Build fresh runtime state for the given definitions.
    ///
    /// Rejects duplicate ids; field validation happens in the engine
    /// before this is called.
    pub fn new(specs: &[TaskSpec]) -> Result<Self> {
        let mut tasks = BTreeMap::new();
        for spec in specs {
            let id = spec.id.clone();
            if tasks.insert(id.clone(), Task::from_spec(spec.clone())).is_some() {
                return Err(SimError::DuplicateTaskId(id));
            }
        }
        Ok(Self { tasks })
    }

    /// Tasks that have arrived and still have work, in id order.
    pub fn ready(&self, tick: Tick) -> Vec<&Task> {
        self.tasks
            .values()
            .filter(|t| t.spec.arrival <= tick && !t.is_complete())
            .collect()
    }

    /// All tasks in the run, in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Mutable access to every task, in id order.
    pub fn tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.values_mut()
    }

    /// Mutable access to the task being dispatched.
    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Whether every task has finished its work.
    pub fn all_complete(&self) -> bool {
        self.tasks.values().all(Task::is_complete)
    }
}
