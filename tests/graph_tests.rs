//! Integration tests for the dependency graph.
//!
//! These run against an in-memory SQLite database through the `Database`
//! API: edge invariants, readiness, chain walking and delete cascade.

use todo_graph_mcp::db::Database;
use todo_graph_mcp::error::{ErrorCode, ToolError};
use todo_graph_mcp::graph::ChainDirection;
use todo_graph_mcp::types::{NewTask, Priority, Status, TaskUpdate};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn add(db: &Database, description: &str) -> i64 {
    db.create_task(NewTask {
        description: description.to_string(),
        ..Default::default()
    })
    .expect("Failed to create task")
    .id
}

fn set_status(db: &Database, id: i64, status: Status) {
    db.update_task(
        id,
        &TaskUpdate {
            status: Some(status),
            ..Default::default()
        },
    )
    .expect("Failed to update status");
}

fn error_code(err: anyhow::Error) -> ErrorCode {
    err.downcast::<ToolError>()
        .expect("Expected a ToolError")
        .code
}

fn edge_count(db: &Database) -> usize {
    db.list_dependencies().unwrap().len()
}

/// 1 blocks 2, 2 blocks 3.
fn chain_db() -> Database {
    let db = setup_db();
    let a = add(&db, "one");
    let b = add(&db, "two");
    let c = add(&db, "three");
    db.add_dependency(a, b).unwrap();
    db.add_dependency(b, c).unwrap();
    db
}

mod edge_tests {
    use super::*;

    #[test]
    fn self_dependency_is_rejected() {
        let db = setup_db();
        let a = add(&db, "a");

        let err = db.add_dependency(a, a).unwrap_err();
        assert_eq!(err.to_string(), "A todo item cannot block itself.");
        assert_eq!(error_code(err), ErrorCode::SelfDependency);
        assert_eq!(edge_count(&db), 0);
    }

    #[test]
    fn self_dependency_is_checked_before_existence() {
        let db = setup_db();
        let err = db.add_dependency(99, 99).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::SelfDependency);
    }

    #[test]
    fn duplicate_dependency_is_rejected_and_store_unchanged() {
        let db = setup_db();
        let a = add(&db, "a");
        let b = add(&db, "b");

        db.add_dependency(a, b).unwrap();
        let err = db.add_dependency(a, b).unwrap_err();

        assert_eq!(
            err.to_string(),
            format!("Dependency already exists: #{} blocks #{}", a, b)
        );
        assert_eq!(error_code(err), ErrorCode::DuplicateDependency);
        assert_eq!(edge_count(&db), 1);
    }

    #[test]
    fn reverse_edge_is_a_different_pair() {
        let db = setup_db();
        let a = add(&db, "a");
        let b = add(&db, "b");

        db.add_dependency(a, b).unwrap();
        db.add_dependency(b, a).unwrap();
        assert_eq!(edge_count(&db), 2);
    }

    #[test]
    fn missing_blocker_is_reported_first() {
        let db = setup_db();
        let err = db.add_dependency(7, 8).unwrap_err();
        assert_eq!(err.to_string(), "Todo item with ID 7 (blocker) not found.");
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);
    }

    #[test]
    fn missing_blocked_is_reported() {
        let db = setup_db();
        let a = add(&db, "a");
        let err = db.add_dependency(a, 8).unwrap_err();
        assert_eq!(err.to_string(), "Todo item with ID 8 (blocked) not found.");
    }

    #[test]
    fn add_then_remove_restores_edge_count() {
        let db = setup_db();
        let a = add(&db, "a");
        let b = add(&db, "b");
        let c = add(&db, "c");
        db.add_dependency(b, c).unwrap();
        let before = edge_count(&db);

        db.add_dependency(a, b).unwrap();
        assert_eq!(edge_count(&db), before + 1);

        db.remove_dependency(a, b).unwrap();
        assert_eq!(edge_count(&db), before);

        let err = db.remove_dependency(a, b).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("No dependency found where #{} blocks #{}", a, b)
        );
        assert_eq!(error_code(err), ErrorCode::DependencyNotFound);
    }

    #[test]
    fn adding_an_edge_does_not_touch_tasks() {
        let db = setup_db();
        let a = add(&db, "a");
        let b = add(&db, "b");
        let before = db.get_task(b).unwrap().unwrap();

        let created = db.add_dependency(a, b).unwrap();
        assert_eq!(created.blocker.description, "a");
        assert_eq!(created.blocked.description, "b");
        assert_eq!(db.get_task(b).unwrap().unwrap(), before);
    }

    #[test]
    fn item_dependencies_lists_both_directions() {
        let db = chain_db();

        let deps = db.item_dependencies(2).unwrap();
        assert_eq!(deps.item.id, 2);
        assert_eq!(deps.blocked_by.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(deps.blocks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3]);
        let last = db.item_dependencies(3).unwrap();
        assert_eq!(last.blocked_by.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
        assert!(last.blocks.is_empty());

        let err = db.item_dependencies(42).unwrap_err();
        assert_eq!(error_code(err), ErrorCode::TaskNotFound);
    }
}

mod cascade_tests {
    use super::*;

    #[test]
    fn deleting_a_task_removes_its_edges_both_ways() {
        let db = chain_db();
        let other = add(&db, "other");
        db.add_dependency(other, 3).unwrap();
        assert_eq!(edge_count(&db), 3);

        db.delete_task(2).unwrap();

        let remaining = db.list_dependencies().unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(
            remaining
                .iter()
                .all(|d| d.blocker.id != 2 && d.blocked.id != 2)
        );
        let last = db.item_dependencies(3).unwrap();
        assert_eq!(last.blocked_by.iter().map(|t| t.id).collect::<Vec<_>>(), vec![other]);
        let first = db.item_dependencies(1).unwrap();
        assert!(first.blocks.is_empty());
    }

    #[test]
    fn deleting_a_missing_task_fails() {
        let db = setup_db();
        let err = db.delete_task(5).unwrap_err();
        assert_eq!(err.to_string(), "Todo item with ID 5 not found.");
    }

    #[test]
    fn cascade_holds_on_a_file_database() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("todo.db");

        {
            let db = Database::open(&path).unwrap();
            let a = add(&db, "a");
            let b = add(&db, "b");
            db.add_dependency(a, b).unwrap();
            db.delete_task(a).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(edge_count(&db), 0);
        assert_eq!(db.get_task(2).unwrap().unwrap().description, "b");
    }
}

mod readiness_tests {
    use super::*;

    fn ready_ids(db: &Database) -> (Vec<i64>, Vec<i64>) {
        let report = db.get_ready_items().unwrap();
        (
            report.ready.iter().map(|t| t.id).collect(),
            report.blocked.iter().map(|b| b.task.id).collect(),
        )
    }

    #[test]
    fn chain_scenario() {
        let db = chain_db();
        assert_eq!(ready_ids(&db), (vec![1], vec![2, 3]));

        set_status(&db, 1, Status::Done);
        assert_eq!(ready_ids(&db), (vec![2], vec![3]));

        let report = db.get_ready_items().unwrap();
        assert_eq!(report.summary.ready_count, 1);
        assert_eq!(report.summary.blocked_count, 1);
        assert_eq!(report.blocked[0].blocked_by[0].id, 2);
    }

    #[test]
    fn resolved_tasks_never_listed() {
        let db = chain_db();
        set_status(&db, 1, Status::Done);
        set_status(&db, 3, Status::Cancelled);

        let (ready, blocked) = ready_ids(&db);
        for id in [1, 3] {
            assert!(!ready.contains(&id));
            assert!(!blocked.contains(&id));
        }
    }

    #[test]
    fn blocked_entry_lists_only_incomplete_blockers() {
        let db = setup_db();
        let a = add(&db, "a");
        let b = add(&db, "b");
        let c = add(&db, "c");
        db.add_dependency(a, c).unwrap();
        db.add_dependency(b, c).unwrap();
        set_status(&db, a, Status::Cancelled);
        set_status(&db, b, Status::InProgress);

        let report = db.get_ready_items().unwrap();
        let entry = report.blocked.iter().find(|e| e.task.id == c).unwrap();
        assert_eq!(entry.blocked_by.len(), 1);
        assert_eq!(entry.blocked_by[0].id, b);
        assert_eq!(entry.blocked_by[0].status, Status::InProgress);
    }

    #[test]
    fn ready_list_prefers_priority_then_due_date() {
        let db = setup_db();
        let low = db
            .create_task(NewTask {
                description: "low".into(),
                priority: Priority::Low,
                ..Default::default()
            })
            .unwrap();
        let high = db
            .create_task(NewTask {
                description: "high".into(),
                priority: Priority::High,
                ..Default::default()
            })
            .unwrap();
        let medium_due = db
            .create_task(NewTask {
                description: "medium due".into(),
                due_date: chrono::NaiveDate::from_ymd_opt(2030, 1, 1),
                ..Default::default()
            })
            .unwrap();
        let medium = add(&db, "medium");

        let (ready, _) = ready_ids(&db);
        assert_eq!(ready, vec![high.id, medium_due.id, medium, low.id]);
    }
}

mod chain_tests {
    use super::*;

    #[test]
    fn upstream_of_last() {
        let db = chain_db();
        let chain = db.get_dependency_chain(3, ChainDirection::Upstream).unwrap();

        let upstream = chain.upstream.as_ref().unwrap();
        assert_eq!(upstream.len(), 1);
        assert_eq!(upstream[0].item.id, 2);
        assert_eq!(upstream[0].children()[0].item.id, 1);
        assert!(chain.downstream.is_none());
    }

    #[test]
    fn downstream_of_first() {
        let db = chain_db();
        let chain = db.get_dependency_chain(1, ChainDirection::Downstream).unwrap();

        let downstream = chain.downstream.as_ref().unwrap();
        assert_eq!(downstream[0].item.id, 2);
        assert_eq!(downstream[0].children()[0].item.id, 3);
    }

    #[test]
    fn both_from_middle() {
        let db = chain_db();
        let chain = db.get_dependency_chain(2, ChainDirection::Both).unwrap();

        assert_eq!(chain.upstream.as_ref().unwrap()[0].item.id, 1);
        assert_eq!(chain.downstream.as_ref().unwrap()[0].item.id, 3);
    }

    #[test]
    fn mutual_block_terminates() {
        let db = setup_db();
        let a = add(&db, "a");
        let b = add(&db, "b");
        db.add_dependency(a, b).unwrap();
        db.add_dependency(b, a).unwrap();

        let chain = db.get_dependency_chain(a, ChainDirection::Both).unwrap();
        let upstream = chain.upstream.as_ref().unwrap();
        assert_eq!(upstream[0].item.id, b);
        assert_eq!(upstream[0].children()[0].item.id, a);
        assert!(upstream[0].children()[0].children().is_empty());
    }

    #[test]
    fn missing_task_is_not_found() {
        let db = setup_db();
        let err = db.get_dependency_chain(9, ChainDirection::Both).unwrap_err();
        assert_eq!(err.to_string(), "Todo item with ID 9 not found.");
    }

    #[test]
    fn chain_reflects_current_status() {
        let db = chain_db();
        set_status(&db, 1, Status::Done);

        let chain = db.get_dependency_chain(3, ChainDirection::Upstream).unwrap();
        let upstream = chain.upstream.as_ref().unwrap();
        assert_eq!(upstream[0].children()[0].item.status, Status::Done);
    }
}
