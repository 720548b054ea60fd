//! User-related entity definitions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Task, TaskCategory, TaskId};

/// One of the two fixed identities that own task lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserName {
    /// The default identity on a fresh install.
    #[default]
    Stockton,
    Brittlyn,
}

impl UserName {
    /// All identities, in switcher order.
    pub const ALL: [UserName; 2] = [Self::Stockton, Self::Brittlyn];

    /// Returns the identity as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stockton => "Stockton",
            Self::Brittlyn => "Brittlyn",
        }
    }

    /// Parses an identity from its stored form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Stockton" => Some(Self::Stockton),
            "Brittlyn" => Some(Self::Brittlyn),
            _ => None,
        }
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown user: {}", s))
    }
}

impl TryFrom<&str> for UserName {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Task lists owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Owning identity.
    pub name: UserName,
    /// Open tasks, in insertion order.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Completed tasks, in the order they were completed.
    #[serde(default)]
    pub completed_tasks: Vec<Task>,
}

impl User {
    /// Creates a user with no tasks.
    pub fn new(name: UserName) -> Self {
        Self {
            name,
            tasks: Vec::new(),
            completed_tasks: Vec::new(),
        }
    }

    /// Returns the open tasks of one category, in insertion order.
    pub fn tasks_in_category(&self, category: TaskCategory) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.category == category)
            .collect()
    }

    /// Returns completed tasks, most recently completed first.
    ///
    /// Tasks without a completion time sort last.
    pub fn completed_by_recency(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.completed_tasks.iter().collect();
        tasks.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        tasks
    }

    /// Finds an open task by id.
    pub fn find_active(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Finds a completed task by id.
    pub fn find_completed(&self, id: &TaskId) -> Option<&Task> {
        self.completed_tasks.iter().find(|task| &task.id == id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_user_name_round_trip() {
        for name in UserName::ALL {
            assert_eq!(UserName::parse(name.as_str()), Some(name));
        }

        let parsed: UserName = "Brittlyn".parse().unwrap();
        assert_eq!(parsed, UserName::Brittlyn);

        let result: Result<UserName, _> = "brittlyn".try_into();
        assert!(result.is_err());
        assert_eq!(UserName::default(), UserName::Stockton);
    }

    #[test]
    fn test_tasks_in_category_keeps_insertion_order() {
        let mut user = User::new(UserName::Stockton);
        user.tasks.push(Task::new("a".into(), "A", TaskCategory::Primary, at(1)));
        user.tasks.push(Task::new("b".into(), "B", TaskCategory::Secondary, at(2)));
        user.tasks.push(Task::new("c".into(), "C", TaskCategory::Primary, at(3)));

        let primary: Vec<&str> = user
            .tasks_in_category(TaskCategory::Primary)
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(primary, vec!["a", "c"]);
        assert_eq!(user.tasks_in_category(TaskCategory::Secondary).len(), 1);
    }

    #[test]
    fn test_completed_by_recency() {
        let mut user = User::new(UserName::Brittlyn);
        let base = Task::new("x".into(), "X", TaskCategory::Primary, at(0));
        user.completed_tasks.push(Task { id: "early".into(), ..base.complete(at(2)) });
        user.completed_tasks.push(Task { id: "late".into(), ..base.complete(at(5)) });
        user.completed_tasks.push(Task {
            id: "unknown".into(),
            completed: true,
            ..base.clone()
        });
        user.completed_tasks.push(Task { id: "middle".into(), ..base.complete(at(3)) });

        let order: Vec<&str> = user
            .completed_by_recency()
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(order, vec!["late", "middle", "early", "unknown"]);
    }

    #[test]
    fn test_find_task() {
        let mut user = User::new(UserName::Stockton);
        let task = Task::new("open".into(), "Open", TaskCategory::Primary, at(1));
        user.completed_tasks.push(task.complete(at(2)));
        user.tasks.push(Task::new("other".into(), "Other", TaskCategory::Primary, at(1)));

        assert!(user.find_active(&"other".into()).is_some());
        assert!(user.find_active(&"open".into()).is_none());
        assert!(user.find_completed(&"open".into()).is_some());
    }
}
