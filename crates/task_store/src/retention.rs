//! Retention sweep for completed tasks.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use entities::{AppState, Task, UserName};

/// Number of days a completed task is kept.
pub const RETENTION_DAYS: i64 = 7;

/// Returns the default retention period.
pub fn retention_period() -> Duration {
    Duration::days(RETENTION_DAYS)
}

/// Drops completed tasks older than the default retention period.
pub fn retention_sweep(state: &Arc<AppState>, now: DateTime<Utc>) -> Arc<AppState> {
    retention_sweep_with(state, now, retention_period())
}

/// Drops completed tasks whose completion time is not strictly after
/// `now - period`.
///
/// Completed tasks without a completion time are kept. When nothing is
/// dropped the input snapshot is returned as is, so the sweep is idempotent
/// and cheap to repeat.
pub fn retention_sweep_with(
    state: &Arc<AppState>,
    now: DateTime<Utc>,
    period: Duration,
) -> Arc<AppState> {
    let Some(cutoff) = now.checked_sub_signed(period) else {
        tracing::warn!(
            period_days = period.num_days(),
            "Retention period reaches past the earliest date, keeping all tasks"
        );
        return Arc::clone(state);
    };
    let keep = |task: &Task| {
        task.completed_at
            .is_none_or(|completed_at| completed_at > cutoff)
    };

    let mut next: Option<AppState> = None;
    for name in UserName::ALL {
        let user = state.user(name);
        if user.completed_tasks.iter().all(keep) {
            continue;
        }

        let before = user.completed_tasks.len();
        let draft = next.get_or_insert_with(|| (**state).clone());
        let user = draft.user_mut(name);
        user.completed_tasks.retain(keep);
        tracing::debug!(
            user = %name,
            evicted = before - user.completed_tasks.len(),
            "Evicted expired completed tasks"
        );
    }

    match next {
        Some(next) => Arc::new(next),
        None => Arc::clone(state),
    }
}
