//! Task-related entity definitions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a task.
///
/// Stored as an opaque string: ids written by older clients are not UUIDs,
/// so no particular format is assumed when reading them back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a task id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Priority bucket of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskCategory {
    /// Must get done.
    #[default]
    Primary,
    /// Nice to get done.
    Secondary,
}

impl TaskCategory {
    /// Returns the category name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "Primary",
            Self::Secondary => "Secondary",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single to-do entry owned by one user.
///
/// `completed_at` is set exactly when `completed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier.
    pub id: TaskId,
    /// What needs doing.
    pub text: String,
    /// Priority bucket.
    pub category: TaskCategory,
    /// Whether the task has been completed.
    pub completed: bool,
    /// When this task was created.
    pub created_at: DateTime<Utc>,
    /// When this task was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Optional user-supplied due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new, not yet completed task.
    pub fn new(
        id: TaskId,
        text: impl Into<String>,
        category: TaskCategory,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            category,
            completed: false,
            created_at,
            completed_at: None,
            due_date: None,
        }
    }

    /// Sets the due date for this task.
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Returns a completed copy of this task.
    pub fn complete(&self, at: DateTime<Utc>) -> Self {
        Self {
            completed: true,
            completed_at: Some(at),
            ..self.clone()
        }
    }

    /// Returns true if the task is still open and its due date has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }

    /// Returns the number of whole days since completion.
    ///
    /// `0` means completed within the last 24 hours.
    pub fn days_since_completion(&self, now: DateTime<Utc>) -> Option<i64> {
        self.completed_at
            .map(|completed_at| (now - completed_at).num_days().max(0))
    }
}

/// Trims user input for a new task.
///
/// Returns `None` when nothing but whitespace is left. The state reducer does
/// not call this; it is offered to input layers, which own text validation.
pub fn normalize_task_text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
