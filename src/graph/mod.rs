//! Dependency graph algorithms.
//!
//! Everything here is a pure function over a [`GraphSnapshot`], which the
//! database layer reads in a single transaction per call. Nothing is cached
//! between calls.

mod chain;
mod ready;

pub use chain::{ChainDirection, ChainNode, ChainResult, dependency_chain};
pub use ready::{BlockedTask, ReadyReport, ReadySummary, ready_items};

use crate::types::{Dependency, Task};
use std::collections::HashMap;

/// All tasks and edges, indexed for traversal in both directions.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    tasks: Vec<Task>,
    index: HashMap<i64, usize>,
    edges: Vec<Dependency>,
    /// blocked_id -> blocker ids, in edge order.
    blockers: HashMap<i64, Vec<i64>>,
    /// blocker_id -> blocked ids, in edge order.
    dependents: HashMap<i64, Vec<i64>>,
}

impl GraphSnapshot {
    /// Build a snapshot. Tasks keep the given order; edges whose endpoints are
    /// missing are kept in `edges()` but never traversed.
    pub fn new(tasks: Vec<Task>, edges: Vec<Dependency>) -> Self {
        let index: HashMap<i64, usize> = tasks
            .iter()
            .enumerate()
            .map(|(pos, task)| (task.id, pos))
            .collect();

        let mut blockers: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut dependents: HashMap<i64, Vec<i64>> = HashMap::new();
        for edge in &edges {
            if !index.contains_key(&edge.blocker_id) || !index.contains_key(&edge.blocked_id) {
                continue;
            }
            blockers.entry(edge.blocked_id).or_default().push(edge.blocker_id);
            dependents.entry(edge.blocker_id).or_default().push(edge.blocked_id);
        }

        Self {
            tasks,
            index,
            edges,
            blockers,
            dependents,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn edges(&self) -> &[Dependency] {
        &self.edges
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.index.get(&id).map(|&pos| &self.tasks[pos])
    }

    /// Ids of tasks that directly block `id`.
    pub fn blockers_of(&self, id: i64) -> &[i64] {
        self.blockers.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of tasks that `id` directly blocks.
    pub fn dependents_of(&self, id: i64) -> &[i64] {
        self.dependents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}
