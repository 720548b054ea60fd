//! Success List application state
//!
//! This crate holds the reducer that turns actions into new state snapshots
//! and the container that owns the live snapshot, hydrates it from storage at
//! startup and saves every change in the background.

mod action;
mod clock;
mod config;
mod container;
mod reducer;

pub use action::*;
pub use clock::*;
pub use config::*;
pub use container::*;
pub use reducer::*;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over `log_level`. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(log_level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    subscriber(filter).try_init()
}

fn subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::registry().with(fmt::layer()).with(filter)
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn test_subscriber_honors_filter_level() {
        tracing::subscriber::with_default(subscriber(EnvFilter::new("debug")), || {
            assert!(tracing::enabled!(Level::INFO));
            assert!(tracing::enabled!(Level::DEBUG));
            assert!(!tracing::enabled!(Level::TRACE));
        });
    }
}
