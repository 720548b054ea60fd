//! Application state snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{User, UserName};

/// The fixed pair of user records.
///
/// One field per identity, so neither record can ever be missing. Each record
/// sits behind an `Arc`: a transition that touches one user shares the other
/// with the previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Users {
    #[serde(rename = "Stockton")]
    pub stockton: Arc<User>,
    #[serde(rename = "Brittlyn")]
    pub brittlyn: Arc<User>,
}

impl Users {
    /// Returns the record for one identity.
    pub fn get(&self, name: UserName) -> &Arc<User> {
        match name {
            UserName::Stockton => &self.stockton,
            UserName::Brittlyn => &self.brittlyn,
        }
    }

    /// Returns a mutable handle to the record for one identity.
    pub fn get_mut(&mut self, name: UserName) -> &mut Arc<User> {
        match name {
            UserName::Stockton => &mut self.stockton,
            UserName::Brittlyn => &mut self.brittlyn,
        }
    }

    /// Iterates over both records in `UserName::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<User>> {
        UserName::ALL.into_iter().map(move |name| self.get(name))
    }
}

impl Default for Users {
    fn default() -> Self {
        Self {
            stockton: Arc::new(User::new(UserName::Stockton)),
            brittlyn: Arc::new(User::new(UserName::Brittlyn)),
        }
    }
}

/// Everything the task tracker knows at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Identity whose lists are being shown and edited.
    pub current_user: UserName,
    /// Task lists of both identities.
    pub users: Users,
}

impl AppState {
    /// Returns the record of the current user.
    pub fn current(&self) -> &User {
        self.users.get(self.current_user)
    }

    /// Returns the record of any identity.
    pub fn user(&self, name: UserName) -> &User {
        self.users.get(name)
    }

    /// Returns a mutable reference to one user's record, cloning it first if
    /// it is shared with another snapshot.
    pub fn user_mut(&mut self, name: UserName) -> &mut User {
        Arc::make_mut(self.users.get_mut(name))
    }

    /// Returns the total number of tasks, open and completed, across users.
    pub fn task_count(&self) -> usize {
        self.users
            .iter()
            .map(|user| user.tasks.len() + user.completed_tasks.len())
            .sum()
    }
}
