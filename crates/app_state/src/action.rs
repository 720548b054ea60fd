//! State transitions understood by the reducer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use entities::{AppState, TaskCategory, TaskId, UserName};

/// A requested change to the application state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the whole state. Used once, to hydrate from storage.
    SetState(Arc<AppState>),
    /// Make another identity current.
    SwitchUser(UserName),
    /// Append a new open task to the current user's list.
    AddTask {
        text: String,
        category: TaskCategory,
        due_date: Option<DateTime<Utc>>,
    },
    /// Move an open task of the current user to their completed list.
    CompleteTask(TaskId),
    /// Drop an open task of the current user.
    DeleteTask(TaskId),
}

impl Action {
    /// Returns a short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetState(_) => "set_state",
            Self::SwitchUser(_) => "switch_user",
            Self::AddTask { .. } => "add_task",
            Self::CompleteTask(_) => "complete_task",
            Self::DeleteTask(_) => "delete_task",
        }
    }
}
