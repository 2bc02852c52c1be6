//! Readiness: which active tasks have no unresolved direct blocker.

use super::GraphSnapshot;
use crate::types::{BlockerRef, Task};
use chrono::NaiveDate;
use serde::Serialize;

/// An active task held up by at least one unresolved direct blocker.
#[derive(Debug, Clone, Serialize)]
pub struct BlockedTask {
    #[serde(flatten)]
    pub task: Task,
    pub blocked_by: Vec<BlockerRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadySummary {
    pub ready_count: usize,
    pub blocked_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadyReport {
    pub ready: Vec<Task>,
    pub blocked: Vec<BlockedTask>,
    pub summary: ReadySummary,
}

/// Partition active tasks into ready and blocked.
///
/// Only direct blockers count: a task is ready as soon as its immediate
/// blockers resolve, even if something further upstream is still open.
/// Resolved tasks appear in neither list. Ready tasks are ordered by
/// priority, then due date with undated tasks last; ties keep snapshot order.
pub fn ready_items(snapshot: &GraphSnapshot) -> ReadyReport {
    let mut ready = Vec::new();
    let mut blocked = Vec::new();

    for task in snapshot.tasks().iter().filter(|t| t.status.is_active()) {
        let incomplete: Vec<BlockerRef> = snapshot
            .blockers_of(task.id)
            .iter()
            .filter_map(|&id| snapshot.task(id))
            .filter(|blocker| blocker.status.is_active())
            .map(Task::to_blocker_ref)
            .collect();

        if incomplete.is_empty() {
            ready.push(task.clone());
        } else {
            blocked.push(BlockedTask {
                task: task.clone(),
                blocked_by: incomplete,
            });
        }
    }

    ready.sort_by_key(|t| (t.priority.rank(), t.due_date.unwrap_or(NaiveDate::MAX)));

    let summary = ReadySummary {
        ready_count: ready.len(),
        blocked_count: blocked.len(),
    };
    ReadyReport {
        ready,
        blocked,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{edge, task};
    use super::*;
    use crate::types::{Priority, Status};

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    fn blocked_ids(blocked: &[BlockedTask]) -> Vec<i64> {
        blocked.iter().map(|b| b.task.id).collect()
    }

    #[test]
    fn chain_readiness_advances_as_blockers_resolve() {
        let edges = vec![edge(1, 1, 2), edge(2, 2, 3)];
        let snapshot = GraphSnapshot::new(
            vec![task(1, Status::Open), task(2, Status::Open), task(3, Status::Open)],
            edges.clone(),
        );

        let report = ready_items(&snapshot);
        assert_eq!(ids(&report.ready), vec![1]);
        assert_eq!(blocked_ids(&report.blocked), vec![2, 3]);

        let snapshot = GraphSnapshot::new(
            vec![task(1, Status::Done), task(2, Status::Open), task(3, Status::Open)],
            edges,
        );
        let report = ready_items(&snapshot);
        assert_eq!(ids(&report.ready), vec![2]);
        assert_eq!(blocked_ids(&report.blocked), vec![3]);
        assert_eq!(
            report.summary,
            ReadySummary {
                ready_count: 1,
                blocked_count: 1
            }
        );
    }

    #[test]
    fn resolved_tasks_are_in_neither_list() {
        let snapshot = GraphSnapshot::new(
            vec![
                task(1, Status::Done),
                task(2, Status::Cancelled),
                task(3, Status::InProgress),
            ],
            vec![edge(1, 3, 1)],
        );

        let report = ready_items(&snapshot);
        assert_eq!(ids(&report.ready), vec![3]);
        assert!(report.blocked.is_empty());
    }

    #[test]
    fn cancelled_blocker_does_not_block() {
        let snapshot = GraphSnapshot::new(
            vec![task(1, Status::Cancelled), task(2, Status::Open)],
            vec![edge(1, 1, 2)],
        );

        assert_eq!(ids(&ready_items(&snapshot).ready), vec![2]);
    }

    #[test]
    fn only_direct_blockers_count() {
        // 1 -> 2 -> 3 with 2 done: 3 is ready although 1 is still open.
        let snapshot = GraphSnapshot::new(
            vec![task(1, Status::Open), task(2, Status::Done), task(3, Status::Open)],
            vec![edge(1, 1, 2), edge(2, 2, 3)],
        );

        assert_eq!(ids(&ready_items(&snapshot).ready), vec![1, 3]);
    }

    #[test]
    fn blocked_lists_only_incomplete_blockers() {
        let snapshot = GraphSnapshot::new(
            vec![task(1, Status::Done), task(2, Status::InProgress), task(3, Status::Open)],
            vec![edge(1, 1, 3), edge(2, 2, 3)],
        );

        let report = ready_items(&snapshot);
        assert_eq!(report.blocked.len(), 1);
        let blockers: Vec<i64> = report.blocked[0].blocked_by.iter().map(|b| b.id).collect();
        assert_eq!(blockers, vec![2]);
        assert_eq!(report.blocked[0].blocked_by[0].status, Status::InProgress);
    }

    #[test]
    fn ready_sorted_by_priority_then_due_date() {
        let mut low = task(1, Status::Open);
        low.priority = Priority::Low;
        let mut high_undated = task(2, Status::Open);
        high_undated.priority = Priority::High;
        let mut high_late = task(3, Status::Open);
        high_late.priority = Priority::High;
        high_late.due_date = NaiveDate::from_ymd_opt(2025, 6, 1);
        let mut high_early = task(4, Status::Open);
        high_early.priority = Priority::High;
        high_early.due_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        let medium = task(5, Status::Open);
        let medium_too = task(6, Status::Open);

        let snapshot = GraphSnapshot::new(
            vec![low, high_undated, high_late, high_early, medium, medium_too],
            vec![],
        );

        assert_eq!(ids(&ready_items(&snapshot).ready), vec![4, 3, 2, 5, 6, 1]);
    }

    #[test]
    fn blocked_entry_serializes_flat() {
        let snapshot = GraphSnapshot::new(
            vec![task(1, Status::Open), task(2, Status::Open)],
            vec![edge(1, 1, 2)],
        );

        let value = serde_json::to_value(ready_items(&snapshot)).unwrap();
        let blocked = &value["blocked"][0];
        assert_eq!(blocked["id"], 2);
        assert_eq!(blocked["status"], "open");
        assert_eq!(blocked["blocked_by"][0]["id"], 1);
        assert_eq!(value["summary"]["ready_count"], 1);
    }
}
