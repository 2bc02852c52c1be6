//! Dependency edges and the graph queries built on them.

use super::tasks::{get_task_internal, load_tasks, require_task};
use super::{Database, format_timestamp, now, parse_timestamp};
use crate::error::ToolError;
use crate::graph::{self, ChainDirection, ChainResult, GraphSnapshot, ReadyReport};
use crate::types::{BlockerRef, Dependency, Task, TaskRef};
use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::debug;

/// A freshly created edge with both endpoints.
#[derive(Debug, Clone)]
pub struct CreatedDependency {
    pub dependency: Dependency,
    pub blocker: Task,
    pub blocked: Task,
}

/// Direct edges around one task.
#[derive(Debug, Clone, Serialize)]
pub struct ItemDependencies {
    pub item: TaskRef,
    /// Tasks that directly block `item`.
    pub blocked_by: Vec<TaskRef>,
    /// Tasks `item` directly blocks.
    pub blocks: Vec<TaskRef>,
}

/// An edge annotated with both endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyDetail {
    pub id: i64,
    pub blocker: BlockerRef,
    pub blocked: BlockerRef,
    pub created_at: NaiveDateTime,
}

fn parse_dependency_row(row: &rusqlite::Row) -> rusqlite::Result<Dependency> {
    let created_at: String = row.get("created_at")?;
    Ok(Dependency {
        id: row.get("id")?,
        blocker_id: row.get("blocker_id")?,
        blocked_id: row.get("blocked_id")?,
        created_at: parse_timestamp(3, &created_at)?,
    })
}

fn find_edge(conn: &Connection, blocker_id: i64, blocked_id: i64) -> Result<Option<Dependency>> {
    let edge = conn
        .query_row(
            "SELECT id, blocker_id, blocked_id, created_at FROM todo_dependency
             WHERE blocker_id = ?1 AND blocked_id = ?2",
            params![blocker_id, blocked_id],
            parse_dependency_row,
        )
        .optional()?;
    Ok(edge)
}

/// All edges in creation order.
pub(crate) fn load_dependencies(conn: &Connection) -> Result<Vec<Dependency>> {
    let mut stmt = conn.prepare(
        "SELECT id, blocker_id, blocked_id, created_at FROM todo_dependency ORDER BY id",
    )?;
    let deps = stmt
        .query_map([], parse_dependency_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(deps)
}

/// Tasks on the other end of `task_id`'s edges, joined on `join_col` and filtered on `match_col`.
fn neighbours(conn: &Connection, task_id: i64, join_col: &str, match_col: &str) -> Result<Vec<TaskRef>> {
    let sql = format!(
        "SELECT t.* FROM todo_dependency d
         INNER JOIN todo t ON d.{join_col} = t.id
         WHERE d.{match_col} = ?1
         ORDER BY d.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let refs = stmt
        .query_map(params![task_id], super::tasks::parse_task_row)?
        .map(|r| r.map(|task| task.to_ref()))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(refs)
}

impl Database {
    /// Add a blocking edge. Cycles are allowed; self-edges and duplicates are not.
    pub fn add_dependency(&self, blocker_id: i64, blocked_id: i64) -> Result<CreatedDependency> {
        if blocker_id == blocked_id {
            return Err(ToolError::self_dependency().into());
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let blocker = get_task_internal(&tx, blocker_id)?
                .ok_or_else(|| ToolError::endpoint_not_found(blocker_id, "blocker"))?;
            let blocked = get_task_internal(&tx, blocked_id)?
                .ok_or_else(|| ToolError::endpoint_not_found(blocked_id, "blocked"))?;

            if find_edge(&tx, blocker_id, blocked_id)?.is_some() {
                return Err(ToolError::duplicate_dependency(blocker_id, blocked_id).into());
            }

            let created_at = now();
            tx.execute(
                "INSERT INTO todo_dependency (blocker_id, blocked_id, created_at)
                 VALUES (?1, ?2, ?3)",
                params![blocker_id, blocked_id, format_timestamp(&created_at)],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            debug!(dependency_id = id, blocker_id, blocked_id, "Created dependency");
            Ok(CreatedDependency {
                dependency: Dependency {
                    id,
                    blocker_id,
                    blocked_id,
                    created_at,
                },
                blocker,
                blocked,
            })
        })
    }

    /// Remove the edge for this exact ordered pair.
    pub fn remove_dependency(&self, blocker_id: i64, blocked_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM todo_dependency WHERE blocker_id = ?1 AND blocked_id = ?2",
                params![blocker_id, blocked_id],
            )?;
            if removed == 0 {
                return Err(ToolError::dependency_not_found(blocker_id, blocked_id).into());
            }
            debug!(blocker_id, blocked_id, "Removed dependency");
            Ok(())
        })
    }

    /// Direct blockers and blocked items of one task.
    pub fn item_dependencies(&self, task_id: i64) -> Result<ItemDependencies> {
        self.with_conn(|conn| {
            let item = require_task(conn, task_id)?;
            Ok(ItemDependencies {
                item: item.to_ref(),
                blocked_by: neighbours(conn, task_id, "blocker_id", "blocked_id")?,
                blocks: neighbours(conn, task_id, "blocked_id", "blocker_id")?,
            })
        })
    }

    /// Every edge, annotated with both endpoints.
    pub fn list_dependencies(&self) -> Result<Vec<DependencyDetail>> {
        let snapshot = self.graph_snapshot()?;
        Ok(snapshot
            .edges()
            .iter()
            .filter_map(|dep| {
                let blocker = snapshot.task(dep.blocker_id)?;
                let blocked = snapshot.task(dep.blocked_id)?;
                Some(DependencyDetail {
                    id: dep.id,
                    blocker: blocker.to_blocker_ref(),
                    blocked: blocked.to_blocker_ref(),
                    created_at: dep.created_at,
                })
            })
            .collect())
    }

    /// Read all tasks and edges in one consistent unit of work.
    pub fn graph_snapshot(&self) -> Result<GraphSnapshot> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let tasks = load_tasks(&tx)?;
            let edges = load_dependencies(&tx)?;
            tx.commit()?;
            Ok(GraphSnapshot::new(tasks, edges))
        })
    }

    /// Partition active tasks into ready and blocked.
    pub fn get_ready_items(&self) -> Result<ReadyReport> {
        let snapshot = self.graph_snapshot()?;
        Ok(graph::ready_items(&snapshot))
    }

    /// Upstream and/or downstream chain from one task.
    pub fn get_dependency_chain(
        &self,
        task_id: i64,
        direction: ChainDirection,
    ) -> Result<ChainResult> {
        let snapshot = self.graph_snapshot()?;
        let chain = graph::dependency_chain(&snapshot, task_id, direction)
            .ok_or_else(|| ToolError::task_not_found(task_id))?;
        Ok(chain)
    }
}
