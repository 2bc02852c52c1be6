//! Dependency and graph tools.

use super::{ToolContext, get_i64, get_strict_string, make_tool, require_i64};
use crate::db::Database;
use crate::graph::ChainDirection;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "add_dependency",
            "Record that one todo item blocks another. The blocked item is not ready until the blocker is done or cancelled.",
            json!({
                "blocker_id": {
                    "type": "integer",
                    "description": "ID of the item that must finish first"
                },
                "blocked_id": {
                    "type": "integer",
                    "description": "ID of the item that waits"
                }
            }),
            vec!["blocker_id", "blocked_id"],
        ),
        make_tool(
            "remove_dependency",
            "Remove the dependency where blocker_id blocks blocked_id.",
            json!({
                "blocker_id": {
                    "type": "integer",
                    "description": "ID of the blocking item"
                },
                "blocked_id": {
                    "type": "integer",
                    "description": "ID of the blocked item"
                }
            }),
            vec!["blocker_id", "blocked_id"],
        ),
        make_tool(
            "list_dependencies",
            "List dependencies. With item_id: the item's direct blockers and the items it blocks. Without: every dependency.",
            json!({
                "item_id": {
                    "type": "integer",
                    "description": "Optional item to focus on"
                }
            }),
            vec![],
        ),
        make_tool(
            "get_ready_items",
            "Split active items into ready (no unfinished direct blockers) and blocked. Ready items are ordered by priority, then due date.",
            json!({}),
            vec![],
        ),
        make_tool(
            "get_dependency_chain",
            "Show the transitive blockers (upstream) and/or blocked items (downstream) of an item as a tree.",
            json!({
                "item_id": {
                    "type": "integer",
                    "description": "ID of the item to start from"
                },
                "direction": {
                    "type": "string",
                    "enum": ["upstream", "downstream", "both"],
                    "description": "Which way to walk (default: both)"
                }
            }),
            vec!["item_id"],
        ),
    ]
}

pub fn add_dependency(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let blocker_id = require_i64(&args, "blocker_id")?;
    let blocked_id = require_i64(&args, "blocked_id")?;

    let created = db.add_dependency(blocker_id, blocked_id)?;

    let message = format!(
        "Created dependency: #{} '{}' blocks #{} '{}'",
        created.blocker.id, created.blocker.description, created.blocked.id, created.blocked.description
    );
    ctx.logger.info(&message);

    Ok(json!({
        "message": message,
        "dependency": {
            "id": created.dependency.id,
            "blocker_id": created.blocker.id,
            "blocker_description": created.blocker.description,
            "blocked_id": created.blocked.id,
            "blocked_description": created.blocked.description,
            "created_at": created.dependency.created_at,
        }
    }))
}

pub fn remove_dependency(db: &Database, ctx: &ToolContext, args: Value) -> Result<Value> {
    let blocker_id = require_i64(&args, "blocker_id")?;
    let blocked_id = require_i64(&args, "blocked_id")?;

    db.remove_dependency(blocker_id, blocked_id)?;

    let message = format!(
        "Removed dependency: #{} no longer blocks #{}",
        blocker_id, blocked_id
    );
    ctx.logger.info(&message);
    Ok(json!({
        "message": message,
        "status": "removed"
    }))
}

pub fn list_dependencies(db: &Database, args: Value) -> Result<Value> {
    match get_i64(&args, "item_id")? {
        Some(item_id) => Ok(serde_json::to_value(db.item_dependencies(item_id)?)?),
        None => Ok(json!({ "dependencies": db.list_dependencies()? })),
    }
}

pub fn get_ready_items(db: &Database, _args: Value) -> Result<Value> {
    Ok(serde_json::to_value(db.get_ready_items()?)?)
}

pub fn get_dependency_chain(db: &Database, args: Value) -> Result<Value> {
    let item_id = require_i64(&args, "item_id")?;
    let direction = get_strict_string(&args, "direction")?
        .map(|s| s.parse::<ChainDirection>())
        .transpose()?
        .unwrap_or_default();

    Ok(serde_json::to_value(db.get_dependency_chain(item_id, direction)?)?)
}
