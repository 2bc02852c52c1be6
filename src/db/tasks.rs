//! Task CRUD and listing.

use super::{Database, format_timestamp, now, parse_timestamp};
use crate::error::ToolError;
use crate::types::{DATE_FORMAT, NewTask, Priority, Status, Task, TaskUpdate, suggest_correction};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, Row, params, params_from_iter};
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::debug;

/// Field a task listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Priority,
    DueDate,
    CreatedAt,
    Status,
    Description,
    Id,
}

impl SortField {
    pub const NAMES: [&'static str; 6] =
        ["priority", "due_date", "created_at", "status", "description", "id"];
}

impl FromStr for SortField {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(SortField::Priority),
            "due_date" => Ok(SortField::DueDate),
            "created_at" => Ok(SortField::CreatedAt),
            "status" => Ok(SortField::Status),
            "description" => Ok(SortField::Description),
            "id" => Ok(SortField::Id),
            _ => {
                let mut message = format!(
                    "Invalid sort field '{}'. Valid fields: {}.",
                    s,
                    SortField::NAMES.join(", ")
                );
                if let Some(suggestion) = suggest_correction(s, &SortField::NAMES) {
                    message.push_str(&format!(" Did you mean '{}'?", suggestion));
                }
                Err(ToolError::invalid_value("sort_by", message))
            }
        }
    }
}

/// Sort specification: a field plus direction (`-field` is descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub descending: bool,
}

impl FromStr for SortSpec {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        Ok(SortSpec {
            field: name.parse()?,
            descending,
        })
    }
}

/// Filters and pagination for `list_tasks`.
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// Explicit status filter; takes precedence over `show_all_statuses`.
    pub statuses: Option<Vec<Status>>,
    /// When no status filter is given, include resolved items too.
    pub show_all_statuses: bool,
    pub priorities: Option<Vec<Priority>>,
    /// Substring matches against the tags column, all must match.
    pub tags: Vec<String>,
    pub sort: Option<SortSpec>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TaskQuery {
    fn is_paginated(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }
}

/// One page of a task listing.
#[derive(Debug, Clone)]
pub struct TaskPage {
    pub items: Vec<Task>,
    /// Matching items before pagination; only set when paginating.
    pub total_count: Option<usize>,
}

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let priority: String = row.get("priority")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let due_date: Option<String> = row.get("due_date")?;

    let conversion = |idx: usize, e: ToolError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    };

    Ok(Task {
        id: row.get("id")?,
        description: row.get("description")?,
        long_description: row.get("long_description")?,
        status: Status::from_str(&status).map_err(|e| conversion(3, e))?,
        priority: Priority::from_str(&priority).map_err(|e| conversion(4, e))?,
        created_at: parse_timestamp(5, &created_at)?,
        updated_at: parse_timestamp(6, &updated_at)?,
        due_date: due_date
            .map(|d| {
                NaiveDate::parse_from_str(&d, DATE_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        7,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })
            .transpose()?,
        tags: row.get("tags")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: i64) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM todo WHERE id = ?1")?;

    match stmt.query_row(params![task_id], parse_task_row) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Like `get_task_internal`, but a missing task is a `TaskNotFound` error.
pub(crate) fn require_task(conn: &Connection, task_id: i64) -> Result<Task> {
    get_task_internal(conn, task_id)?.ok_or_else(|| ToolError::task_not_found(task_id).into())
}

/// All tasks in ascending id order.
pub(crate) fn load_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM todo ORDER BY id")?;
    let tasks = stmt
        .query_map([], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Default listing order: priority, then due date (undated last), then age.
fn default_order(a: &Task, b: &Task) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| a.due_date.unwrap_or(NaiveDate::MAX).cmp(&b.due_date.unwrap_or(NaiveDate::MAX)))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

fn field_order(field: SortField, a: &Task, b: &Task) -> Ordering {
    match field {
        SortField::Priority => default_order(a, b),
        SortField::DueDate => a
            .due_date
            .unwrap_or(NaiveDate::MAX)
            .cmp(&b.due_date.unwrap_or(NaiveDate::MAX)),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::Description => a.description.cmp(&b.description),
        SortField::Id => a.id.cmp(&b.id),
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl Database {
    /// Create a new task in the `open` state.
    pub fn create_task(&self, new: NewTask) -> Result<Task> {
        let now = now();
        let ts = format_timestamp(&now);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO todo (
                    description, long_description, status, priority,
                    created_at, updated_at, due_date, tags
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &new.description,
                    &new.long_description,
                    Status::Open.as_str(),
                    new.priority.as_str(),
                    &ts,
                    &ts,
                    new.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
                    &new.tags,
                ],
            )?;

            let id = conn.last_insert_rowid();
            debug!(task_id = id, "Created todo item");
            require_task(conn, id)
        })
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// List tasks with filters, sorting and pagination.
    pub fn list_tasks(&self, query: &TaskQuery) -> Result<TaskPage> {
        let mut sql = String::from("SELECT * FROM todo WHERE 1=1");
        let mut values: Vec<String> = Vec::new();

        let statuses = match &query.statuses {
            Some(statuses) if !statuses.is_empty() => Some(statuses.clone()),
            _ if !query.show_all_statuses => Some(vec![Status::Open, Status::InProgress]),
            _ => None,
        };
        if let Some(statuses) = statuses {
            let placeholders = vec!["?"; statuses.len()].join(", ");
            sql.push_str(&format!(" AND status IN ({})", placeholders));
            values.extend(statuses.iter().map(|s| s.as_str().to_string()));
        }

        if let Some(priorities) = query.priorities.as_ref().filter(|p| !p.is_empty()) {
            let placeholders = vec!["?"; priorities.len()].join(", ");
            sql.push_str(&format!(" AND priority IN ({})", placeholders));
            values.extend(priorities.iter().map(|p| p.as_str().to_string()));
        }

        for tag in &query.tags {
            sql.push_str(" AND tags LIKE '%' || ? || '%' ESCAPE '\\'");
            values.push(escape_like(tag));
        }

        sql.push_str(" ORDER BY id");

        let mut tasks = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let tasks = stmt
                .query_map(params_from_iter(values.iter()), parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })?;

        match query.sort {
            Some(spec) if spec.descending => tasks.sort_by(|a, b| field_order(spec.field, b, a)),
            Some(spec) => tasks.sort_by(|a, b| field_order(spec.field, a, b)),
            None => tasks.sort_by(default_order),
        }

        let total = tasks.len();
        let offset = query.offset.unwrap_or(0);
        let items: Vec<Task> = tasks
            .into_iter()
            .skip(offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(TaskPage {
            items,
            total_count: query.is_paginated().then_some(total),
        })
    }

    /// Apply a partial update. An empty update returns the task untouched.
    pub fn update_task(&self, task_id: i64, update: &TaskUpdate) -> Result<Task> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut task = require_task(&tx, task_id)?;

            if update.is_empty() {
                return Ok(task);
            }

            if let Some(description) = &update.description {
                task.description = description.clone();
            }
            if let Some(status) = update.status {
                task.status = status;
            }
            if let Some(priority) = update.priority {
                task.priority = priority;
            }
            if let Some(due_date) = update.due_date {
                task.due_date = due_date;
            }
            if let Some(tags) = &update.tags {
                task.tags = tags.clone();
            }
            if let Some(long_description) = &update.long_description {
                task.long_description = long_description.clone();
            }
            task.updated_at = now();

            tx.execute(
                "UPDATE todo SET
                    description = ?1, long_description = ?2, status = ?3, priority = ?4,
                    updated_at = ?5, due_date = ?6, tags = ?7
                 WHERE id = ?8",
                params![
                    &task.description,
                    &task.long_description,
                    task.status.as_str(),
                    task.priority.as_str(),
                    format_timestamp(&task.updated_at),
                    task.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
                    &task.tags,
                    task_id,
                ],
            )?;
            tx.commit()?;

            debug!(task_id, status = %task.status, "Updated todo item");
            Ok(task)
        })
    }

    /// Delete a task and every dependency edge touching it. Returns the removed task.
    pub fn delete_task(&self, task_id: i64) -> Result<Task> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let task = require_task(&tx, task_id)?;

            let edges = tx.execute(
                "DELETE FROM todo_dependency WHERE blocker_id = ?1 OR blocked_id = ?1",
                params![task_id],
            )?;
            tx.execute("DELETE FROM todo WHERE id = ?1", params![task_id])?;
            tx.commit()?;

            debug!(task_id, edges_removed = edges, "Removed todo item");
            Ok(task)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_spec_parses_direction() {
        let spec: SortSpec = "-due_date".parse().unwrap();
        assert_eq!(spec.field, SortField::DueDate);
        assert!(spec.descending);

        let spec: SortSpec = "id".parse().unwrap();
        assert_eq!(spec.field, SortField::Id);
        assert!(!spec.descending);
    }

    #[test]
    fn invalid_sort_field_suggests() {
        let err = "priorty".parse::<SortSpec>().unwrap_err();
        assert!(err.message.contains("Invalid sort field 'priorty'"));
        assert!(err.message.contains("Did you mean 'priority'?"));
    }

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
