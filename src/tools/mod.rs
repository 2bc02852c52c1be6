//! MCP tool implementations.

pub mod context;
pub mod deps;
pub mod guide;
pub mod tasks;

pub use context::ToolContext;

use crate::db::Database;
use crate::error::{ToolError, ToolResult};
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Tool handler that processes MCP tool calls.
pub struct ToolHandler {
    pub db: Arc<Database>,
}

impl ToolHandler {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get all available tools.
    pub fn get_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::new();

        // Task tools
        tools.extend(tasks::get_tools());

        // Dependency tools
        tools.extend(deps::get_tools());

        // Guide
        tools.extend(guide::get_tools());

        tools
    }

    /// Call a tool by name.
    pub fn call_tool(&self, name: &str, arguments: Value, ctx: &ToolContext) -> Result<Value> {
        match name {
            // Task tools
            "add_item" => tasks::add_item(&self.db, ctx, arguments),
            "get_item_by_id" => tasks::get_item_by_id(&self.db, arguments),
            "list_items" => tasks::list_items(&self.db, arguments),
            "update_item" => tasks::update_item(&self.db, ctx, arguments),
            "mark_item_done" => tasks::mark_item_done(&self.db, ctx, arguments),
            "remove_item" => tasks::remove_item(&self.db, ctx, arguments),

            // Dependency tools
            "add_dependency" => deps::add_dependency(&self.db, ctx, arguments),
            "remove_dependency" => deps::remove_dependency(&self.db, ctx, arguments),
            "list_dependencies" => deps::list_dependencies(&self.db, arguments),
            "get_ready_items" => deps::get_ready_items(&self.db, arguments),
            "get_dependency_chain" => deps::get_dependency_chain(&self.db, arguments),

            // Guide
            "assistant_workflow_guide" => guide::assistant_workflow_guide(arguments),

            _ => Err(ToolError::unknown_tool(name).into()),
        }
    }

    /// Call a tool and fold any failure into `{"error": "..."}`.
    pub fn dispatch(&self, name: &str, arguments: Value, ctx: &ToolContext) -> Value {
        let start = Instant::now();
        match self.call_tool(name, arguments, ctx) {
            Ok(result) => {
                debug!(
                    tool = %name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call succeeded"
                );
                result
            }
            Err(e) => {
                let err = ToolError::from(e);
                warn!(
                    tool = %name,
                    error_code = ?err.code,
                    error_field = ?err.field,
                    error_message = %err.message,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool call failed"
                );
                ctx.logger.warning(&err.message);
                err.to_response()
            }
        }
    }
}

/// Helper to create a tool definition.
pub fn make_tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    let input_schema = rmcp::model::JsonObject::from_iter([
        ("type".to_string(), serde_json::json!("object")),
        ("properties".to_string(), properties),
        ("required".to_string(), serde_json::json!(required)),
    ]);

    Tool::new(name.to_string(), description.to_string(), input_schema)
}

/// Helper to get a string from arguments.
pub fn get_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str().map(String::from))
}

/// Optional string argument where a present non-string value is an error.
/// Missing and `null` both mean "not given".
pub fn get_strict_string(args: &Value, key: &str) -> ToolResult<Option<String>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ToolError::invalid_value(
            key,
            format!("{} must be a string", key),
        )),
    }
}

/// Helper to get a bool from arguments.
pub fn get_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}

/// Optional integer argument. Present-but-not-an-integer is an error, and
/// numeric strings are accepted.
pub fn get_i64(args: &Value, key: &str) -> ToolResult<Option<i64>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ToolError::invalid_value(key, format!("{} must be an integer", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ToolError::invalid_value(key, format!("{} must be an integer", key))),
        Some(_) => Err(ToolError::invalid_value(
            key,
            format!("{} must be an integer", key),
        )),
    }
}

/// Required integer argument.
pub fn require_i64(args: &Value, key: &str) -> ToolResult<i64> {
    get_i64(args, key)?.ok_or_else(|| ToolError::missing_field(key))
}

/// Optional non-negative count (limit/offset).
pub fn get_usize(args: &Value, key: &str) -> ToolResult<Option<usize>> {
    match get_i64(args, key)? {
        None => Ok(None),
        Some(n) => usize::try_from(n).map(Some).map_err(|_| {
            ToolError::invalid_value(key, format!("{} must not be negative", key))
        }),
    }
}

/// A string or an array of strings, normalised to a list.
pub fn get_string_or_array(args: &Value, key: &str) -> Option<Vec<String>> {
    match args.get(key)? {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(arr) => Some(
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
        ),
        _ => None,
    }
}
