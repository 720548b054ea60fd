//! Core entity definitions for Success List.
//!
//! This crate defines the data types shared by the persistence layer and the
//! state container: tasks, the two fixed users, and the application state
//! snapshot that ties them together.

mod state;
mod task;
mod user;

pub use state::*;
pub use task::*;
pub use user::*;
