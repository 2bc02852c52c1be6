//! Core types for the todo graph.

use crate::error::ToolError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage/wire format for timestamps (ISO-8601, microsecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Storage/wire format for due dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Minimum similarity for a "did you mean" suggestion.
const SUGGESTION_CUTOFF: f64 = 0.6;

/// Lifecycle status of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Done,
    Cancelled,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Open,
        Status::InProgress,
        Status::Done,
        Status::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Done => "done",
            Status::Cancelled => "cancelled",
        }
    }

    /// Done and cancelled items no longer block anything.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Status::Done | Status::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        !self.is_resolved()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| invalid_enum("status", s, &Status::ALL.map(|st| st.as_str())))
    }
}

/// Priority of a todo item. Variant order is sort order: high sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Sort rank: high=1, medium=2, low=3.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| invalid_enum("priority", s, &Priority::ALL.map(|p| p.as_str())))
    }
}

/// Build the standard invalid-enum error, with a suggestion when one is close.
pub(crate) fn invalid_enum(field: &str, value: &str, valid: &[&str]) -> ToolError {
    let mut message = format!(
        "Invalid {}: '{}'. Valid: {}.",
        field,
        value,
        valid.join(", ")
    );
    if let Some(suggestion) = suggest_correction(&value.trim().to_lowercase(), valid) {
        message.push_str(&format!(" Did you mean '{}'?", suggestion));
    }
    ToolError::invalid_value(field, message)
}

/// Closest valid value by normalized edit distance, if it clears the cutoff.
pub fn suggest_correction<'a>(value: &str, valid: &[&'a str]) -> Option<&'a str> {
    valid
        .iter()
        .map(|candidate| (*candidate, similarity(value, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_CUTOFF)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}

fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    // Two-row Levenshtein.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    1.0 - prev[b.len()] as f64 / longest as f64
}

/// A todo item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub description: String,
    pub long_description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub due_date: Option<NaiveDate>,
    pub tags: Option<String>,
}

impl Task {
    pub fn to_ref(&self) -> TaskRef {
        TaskRef {
            id: self.id,
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
        }
    }

    pub fn to_blocker_ref(&self) -> BlockerRef {
        BlockerRef {
            id: self.id,
            description: self.description.clone(),
            status: self.status,
        }
    }
}

/// Compact descriptor used by dependency listings and chain nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: i64,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
}

/// Descriptor of a blocking (or blocked) endpoint, without priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerRef {
    pub id: i64,
    pub description: String,
    pub status: Status,
}

/// A directed "blocks" edge: `blocker_id` must resolve before `blocked_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: i64,
    pub blocker_id: i64,
    pub blocked_id: i64,
    pub created_at: NaiveDateTime,
}

/// Fields for a new todo item.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub description: String,
    pub long_description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Option<String>,
}

/// Partial update. Outer `None` leaves a field alone; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub tags: Option<Option<String>>,
    pub long_description: Option<Option<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
            && self.long_description.is_none()
    }
}

/// Parse a `YYYY-MM-DD` due date.
pub fn parse_due_date(s: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
        ToolError::invalid_value(
            "due_date",
            format!(
                "Invalid date format for due date: '{}'. Please use YYYY-MM-DD.",
                s
            ),
        )
    })
}
