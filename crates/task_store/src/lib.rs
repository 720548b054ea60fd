//! Key-value persistence for Success List
//!
//! This crate stores the application state snapshot and the last active user
//! in any string key-value store, repairs persisted data on the way back in,
//! and implements the retention sweep for old completed tasks.

mod error;
mod file;
mod kv;
mod persistence;
mod retention;
mod snapshot;

pub use error::*;
pub use file::*;
pub use kv::*;
pub use persistence::*;
pub use retention::*;
pub use snapshot::*;
