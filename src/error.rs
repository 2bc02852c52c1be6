//! Structured error types for tool responses.
//!
//! Tool failures are data, not faults: at the dispatch boundary every error is
//! flattened into `{"error": "<message>"}` and handed back to the caller.

use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling and logging.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidArgument,
    SelfDependency,

    // Not found errors
    TaskNotFound,
    DependencyNotFound,

    // Conflict errors
    DuplicateDependency,

    // Internal errors
    DatabaseError,
    InternalError,
    UnknownTool,
}

/// Structured error for tool responses.
#[derive(Debug, Error, Serialize)]
#[error("{message}")]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, reason).with_field(field)
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Todo item with ID {} not found.", task_id),
        )
    }

    /// Missing endpoint of a dependency, labelled with its role.
    pub fn endpoint_not_found(task_id: i64, role: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Todo item with ID {} ({}) not found.", task_id, role),
        )
    }

    pub fn self_dependency() -> Self {
        Self::new(
            ErrorCode::SelfDependency,
            "A todo item cannot block itself.",
        )
    }

    pub fn duplicate_dependency(blocker_id: i64, blocked_id: i64) -> Self {
        Self::new(
            ErrorCode::DuplicateDependency,
            format!(
                "Dependency already exists: #{} blocks #{}",
                blocker_id, blocked_id
            ),
        )
    }

    pub fn dependency_not_found(blocker_id: i64, blocked_id: i64) -> Self {
        Self::new(
            ErrorCode::DependencyNotFound,
            format!(
                "No dependency found where #{} blocks #{}",
                blocker_id, blocked_id
            ),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorCode::UnknownTool, format!("Unknown tool: {}", name))
    }

    /// The wire shape every caller checks for.
    pub fn to_response(&self) -> Value {
        json!({ "error": self.message })
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ToolError>() {
            Ok(tool_err) => return tool_err,
            Err(err) => err,
        };
        match err.downcast::<rusqlite::Error>() {
            Ok(sql_err) => ToolError::database(sql_err),
            Err(err) => ToolError::internal(err),
        }
    }
}

/// Result type for tool operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_has_single_error_key() {
        let resp = ToolError::self_dependency().to_response();
        let obj = resp.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["error"], "A todo item cannot block itself.");
    }

    #[test]
    fn anyhow_roundtrip_keeps_code() {
        let err: anyhow::Error = ToolError::task_not_found(7).into();
        let back = ToolError::from(err);
        assert_eq!(back.code, ErrorCode::TaskNotFound);
        assert_eq!(back.message, "Todo item with ID 7 not found.");
    }

    #[test]
    fn foreign_errors_become_internal() {
        let back = ToolError::from(anyhow::anyhow!("boom"));
        assert_eq!(back.code, ErrorCode::InternalError);
    }

    #[test]
    fn sqlite_errors_become_database_errors() {
        let back = ToolError::from(anyhow::Error::from(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(back.code, ErrorCode::DatabaseError);
    }
}
