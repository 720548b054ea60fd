//! Pure state transitions.
//!
//! The reducer never validates its input. Task text is whatever the caller
//! passes, and an id that is not in the current user's open list turns
//! `CompleteTask` / `DeleteTask` into no-ops, so a stale UI can safely repeat
//! them. Any transition that changes nothing returns the very same snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use entities::{AppState, Task, TaskId};

use crate::{Action, Clock, IdGenerator, SystemClock, UuidGenerator};

/// Applies actions to state snapshots.
#[derive(Clone)]
pub struct Reducer {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl Reducer {
    /// Creates a reducer with the given time and id sources.
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { clock, ids }
    }

    /// Returns the current time as seen by this reducer.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Returns the snapshot that results from applying `action` to `state`.
    pub fn reduce(&self, state: &Arc<AppState>, action: Action) -> Arc<AppState> {
        match action {
            Action::SetState(next) => next,
            Action::SwitchUser(name) => {
                if state.current_user == name {
                    return Arc::clone(state);
                }
                Arc::new(AppState {
                    current_user: name,
                    users: state.users.clone(),
                })
            }
            Action::AddTask {
                text,
                category,
                due_date,
            } => {
                let mut task = Task::new(self.ids.next_id(), text, category, self.clock.now());
                task.due_date = due_date;

                let mut next = (**state).clone();
                let current = next.current_user;
                next.user_mut(current).tasks.push(task);
                Arc::new(next)
            }
            Action::CompleteTask(id) => {
                let Some(index) = position_of(state, &id) else {
                    return Arc::clone(state);
                };

                let mut next = (**state).clone();
                let current = next.current_user;
                let user = next.user_mut(current);
                let task = user.tasks.remove(index);
                user.completed_tasks.push(task.complete(self.clock.now()));
                Arc::new(next)
            }
            Action::DeleteTask(id) => {
                let Some(index) = position_of(state, &id) else {
                    return Arc::clone(state);
                };

                let mut next = (**state).clone();
                let current = next.current_user;
                next.user_mut(current).tasks.remove(index);
                Arc::new(next)
            }
        }
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(UuidGenerator))
    }
}

impl std::fmt::Debug for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer").finish_non_exhaustive()
    }
}

/// Index of an open task of the current user.
fn position_of(state: &AppState, id: &TaskId) -> Option<usize> {
    state.current().tasks.iter().position(|task| &task.id == id)
}
