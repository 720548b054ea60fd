//! Persisted representation of the application state.
//!
//! Reading goes through loosely typed records first so that blobs written by
//! older clients (date-only strings, epoch milliseconds, a missing user entry)
//! can be repaired into a well-formed `AppState`.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use entities::{AppState, Task, TaskCategory, TaskId, User, UserName, Users};
use serde::Deserialize;

use crate::{StoreError, StoreResult};

/// Timestamp exactly as found in a persisted blob.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum StoredTimestamp {
    Text(String),
    EpochMillis(i64),
}

impl StoredTimestamp {
    fn repair(&self) -> StoreResult<DateTime<Utc>> {
        match self {
            Self::Text(text) => parse_timestamp(text),
            Self::EpochMillis(millis) => DateTime::<Utc>::from_timestamp_millis(*millis)
                .ok_or_else(|| {
                    StoreError::InvalidData(format!("timestamp out of range: {}", millis))
                }),
        }
    }
}

/// Parses a timestamp string.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00.000Z`), a date-time without offset
/// (read as UTC), and a bare date (UTC midnight).
pub fn parse_timestamp(text: &str) -> StoreResult<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(StoreError::InvalidData(format!(
        "unrecognized timestamp: {:?}",
        text
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: TaskId,
    text: String,
    category: TaskCategory,
    #[serde(default)]
    completed: bool,
    created_at: StoredTimestamp,
    #[serde(default)]
    completed_at: Option<StoredTimestamp>,
    #[serde(default)]
    due_date: Option<StoredTimestamp>,
}

impl StoredTask {
    fn repair(self) -> StoreResult<Task> {
        Ok(Task {
            id: self.id,
            text: self.text,
            category: self.category,
            completed: self.completed,
            created_at: self.created_at.repair()?,
            completed_at: self.completed_at.as_ref().map(StoredTimestamp::repair).transpose()?,
            due_date: self.due_date.as_ref().map(StoredTimestamp::repair).transpose()?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(default)]
    tasks: Vec<StoredTask>,
    #[serde(default)]
    completed_tasks: Vec<StoredTask>,
}

impl StoredUser {
    /// Rebuilds a user record so that list membership decides the completion
    /// flags. An id present in both lists keeps only its completed copy.
    fn repair(self, name: UserName) -> StoreResult<User> {
        let completed_tasks: Vec<Task> = repair_tasks(self.completed_tasks)?
            .into_iter()
            .map(|task| Task {
                completed: true,
                ..task
            })
            .collect();

        let mut tasks = Vec::with_capacity(self.tasks.len());
        for task in repair_tasks(self.tasks)? {
            if completed_tasks.iter().any(|done| done.id == task.id) {
                tracing::warn!(
                    user = %name,
                    task_id = %task.id,
                    "Dropping open copy of completed task"
                );
                continue;
            }
            tasks.push(Task {
                completed: false,
                completed_at: None,
                ..task
            });
        }

        Ok(User {
            name,
            tasks,
            completed_tasks,
        })
    }
}

fn repair_tasks(tasks: Vec<StoredTask>) -> StoreResult<Vec<Task>> {
    tasks.into_iter().map(StoredTask::repair).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    #[serde(default)]
    current_user: Option<String>,
    #[serde(default)]
    users: HashMap<String, StoredUser>,
}

/// Serializes a state snapshot into the persisted blob format.
pub fn encode_state(state: &AppState) -> StoreResult<String> {
    Ok(serde_json::to_string(state)?)
}

/// Parses a persisted blob and repairs it into a well-formed state.
///
/// Missing user entries become empty users, entries for unknown users are
/// dropped, and an unknown embedded current user falls back to the default
/// identity. Any malformed JSON or unreadable timestamp fails the whole blob.
pub fn decode_state(blob: &str) -> StoreResult<AppState> {
    let mut stored: StoredState = serde_json::from_str(blob)?;

    let current_user = match stored.current_user.as_deref() {
        Some(raw) => UserName::parse(raw).unwrap_or_else(|| {
            tracing::warn!(current_user = %raw, "Unknown current user in stored state");
            UserName::default()
        }),
        None => UserName::default(),
    };

    let mut users = Users::default();
    for name in UserName::ALL {
        match stored.users.remove(name.as_str()) {
            Some(user) => *users.get_mut(name) = Arc::new(user.repair(name)?),
            None => tracing::debug!(user = %name, "No stored entry for user, starting empty"),
        }
    }
    for unknown in stored.users.keys() {
        tracing::warn!(user = %unknown, "Ignoring stored entry for unknown user");
    }

    Ok(AppState {
        current_user,
        users,
    })
}
