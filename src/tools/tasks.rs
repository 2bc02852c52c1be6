//! Task CRUD tools.

use super::{
    ToolContext, get_bool, get_strict_string, get_string, get_string_or_array, get_usize,
    make_tool, require_i64,
};
use crate::db::Database;
use crate::db::tasks::{SortSpec, TaskQuery};
use crate::error::ToolError;
use crate::types::{NewTask, Priority, Status, TaskUpdate, parse_due_date};
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "add_item",
            "Add a new todo item. Use rich metadata: priority, due date and comma-separated tags.",
            json!({
                "description": {
                    "type": "string",
                    "description": "Short description of the todo item"
                },
                "priority": {
                    "type": "string",
                    "enum": ["high", "medium", "low"],
                    "description": "Priority level (default: medium)"
                },
                "due_date": {
                    "type": "string",
                    "description": "Due date in YYYY-MM-DD format"
                },
                "tags": {
                    "type": "string",
                    "description": "Comma-separated tags"
                },
                "long_description": {
                    "type": "string",
                    "description": "Detailed description with context, requirements or notes"
                }
            }),
            vec!["description"],
        ),
        make_tool(
            "get_item_by_id",
            "Get a single todo item by ID.",
            json!({
                "item_id": {
                    "type": "integer",
                    "description": "ID of the todo item"
                }
            }),
            vec!["item_id"],
        ),
        make_tool(
            "list_items",
            "List todo items. By default only open and in_progress items are shown, ordered by priority, due date and creation time.",
            json!({
                "show_all_statuses": {
                    "type": "boolean",
                    "description": "Include done and cancelled items (ignored when status_filter is set)"
                },
                "status_filter": {
                    "oneOf": [
                        { "type": "string", "enum": ["open", "in_progress", "done", "cancelled"] },
                        { "type": "array", "items": { "type": "string" } }
                    ],
                    "description": "Filter by one or more statuses"
                },
                "priority_filter": {
                    "oneOf": [
                        { "type": "string", "enum": ["high", "medium", "low"] },
                        { "type": "array", "items": { "type": "string" } }
                    ],
                    "description": "Filter by one or more priorities"
                },
                "tag_filter": {
                    "oneOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" } }
                    ],
                    "description": "Tag substrings; items must match all of them"
                },
                "sort_by": {
                    "type": "string",
                    "description": "priority, due_date, created_at, status, description or id; prefix with '-' for descending"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of items to return"
                },
                "offset": {
                    "type": "integer",
                    "description": "Number of items to skip"
                }
            }),
            vec![],
        ),
        make_tool(
            "update_item",
            "Update a todo item. Only provided fields change; pass 'none' to clear due_date, tags or long_description. Only mark an item done once the project's tests pass.",
            json!({
                "item_id": {
                    "type": "integer",
                    "description": "ID of the todo item"
                },
                "description": {
                    "type": "string",
                    "description": "New short description"
                },
                "status": {
                    "type": "string",
                    "enum": ["open", "in_progress", "done", "cancelled"],
                    "description": "New status"
                },
                "priority": {
                    "type": "string",
                    "enum": ["high", "medium", "low"],
                    "description": "New priority"
                },
                "due_date": {
                    "type": "string",
                    "description": "New due date (YYYY-MM-DD) or 'none'"
                },
                "tags": {
                    "type": "string",
                    "description": "New comma-separated tags or 'none'"
                },
                "long_description": {
                    "type": "string",
                    "description": "New detailed description or 'none'"
                }
            }),
            vec!["item_id"],
        ),
        make_tool(
            "mark_item_done",
            "Mark a todo item as done. Only do this once the project's tests pass.",
            json!({
                "item_id": {
                    "type": "integer",
                    "description": "ID of the todo item"
                }
            }),
            vec!["item_id"],
        ),
        make_tool(
            "remove_item",
            "Remove a todo item. Dependencies on or from it are removed too.",
            json!({
                "item_id": {
                    "type": "integer",
                    "description": "ID of the todo item"
                }
            }),
            vec!["item_id"],
        ),
    ]
}

fn parse_list<T, F>(values: Option<Vec<String>>, parse: F) -> Result<Option<Vec<T>>>
where
    F: Fn(&str) -> std::result::Result<T, ToolError>,
{
    values
        .map(|vs| vs.iter().map(|v| parse(v)).collect::<std::result::Result<Vec<_>, _>>())
        .transpose()
        .map_err(Into::into)
}

/// `"none"` (any case) means "clear this field".
fn clearable(args: &Value, key: &str) -> Option<Option<String>> {
    get_string(args, key).map(|s| if s.eq_ignore_ascii_case("none") { None } else { Some(s) })
}

pub fn add_item(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let description =
        get_string(&args, "description").ok_or_else(|| ToolError::missing_field("description"))?;
    let priority = get_strict_string(&args, "priority")?
        .map(|s| s.parse::<Priority>())
        .transpose()?
        .unwrap_or_default();
    let due_date = get_string(&args, "due_date")
        .filter(|s| !s.is_empty())
        .map(|s| parse_due_date(&s))
        .transpose()?;

    let task = db.create_task(NewTask {
        description,
        long_description: get_string(&args, "long_description"),
        priority,
        due_date,
        tags: get_string(&args, "tags"),
    })?;

    ctx.logger
        .info(&format!("Added todo item #{}: '{}'", task.id, task.description));
    Ok(serde_json::to_value(task)?)
}

pub fn get_item_by_id(db: &Database, args: Value) -> Result<Value> {
    let item_id = require_i64(&args, "item_id")?;
    let task = db
        .get_task(item_id)?
        .ok_or_else(|| ToolError::task_not_found(item_id))?;
    Ok(serde_json::to_value(task)?)
}

pub fn list_items(db: &Database, args: Value) -> Result<Value> {
    let query = TaskQuery {
        statuses: parse_list(get_string_or_array(&args, "status_filter"), |s| s.parse::<Status>())?,
        show_all_statuses: get_bool(&args, "show_all_statuses").unwrap_or(false),
        priorities: parse_list(get_string_or_array(&args, "priority_filter"), |s| {
            s.parse::<Priority>()
        })?,
        tags: get_string_or_array(&args, "tag_filter").unwrap_or_default(),
        sort: get_string(&args, "sort_by")
            .map(|s| s.parse::<SortSpec>())
            .transpose()?,
        limit: get_usize(&args, "limit")?,
        offset: get_usize(&args, "offset")?,
    };

    let page = db.list_tasks(&query)?;

    let mut response = json!({ "items": page.items });
    if let Some(total) = page.total_count {
        response["total_count"] = json!(total);
    }
    Ok(response)
}

pub fn update_item(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let item_id = require_i64(&args, "item_id")?;

    let update = TaskUpdate {
        description: get_string(&args, "description"),
        status: get_strict_string(&args, "status")?
            .map(|s| s.parse::<Status>())
            .transpose()?,
        priority: get_strict_string(&args, "priority")?
            .map(|s| s.parse::<Priority>())
            .transpose()?,
        due_date: clearable(&args, "due_date")
            .map(|d| d.map(|s| parse_due_date(&s)).transpose())
            .transpose()?,
        tags: clearable(&args, "tags"),
        long_description: clearable(&args, "long_description"),
    };

    let task = db.update_task(item_id, &update)?;

    if update.is_empty() {
        return Ok(json!({
            "message": "No changes specified for the item.",
            "item": task
        }));
    }

    ctx.logger
        .info(&format!("Updated todo item #{} ({})", task.id, task.status));
    Ok(serde_json::to_value(task)?)
}

pub fn mark_item_done(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let item_id = require_i64(&args, "item_id")?;
    update_item(db, ctx, json!({ "item_id": item_id, "status": "done" }))
}

pub fn remove_item(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let item_id = require_i64(&args, "item_id")?;
    let task = db.delete_task(item_id)?;

    let message = format!("Removed todo item #{}: '{}'", item_id, task.description);
    ctx.logger.info(&message);
    Ok(json!({
        "message": message,
        "id": item_id,
        "status": "removed"
    }))
}
