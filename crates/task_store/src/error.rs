//! Task store error types.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key that the backend cannot represent.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Persisted data that could not be turned back into state.
    #[error("Invalid persisted data: {0}")]
    InvalidData(String),

    /// Other backend failure.
    #[error("{0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
