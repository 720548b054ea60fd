//! Loading and saving the application state through a key-value store.

use entities::{AppState, UserName};

use crate::{decode_state, encode_state, KeyValueStore, StoreResult};

/// Key holding the serialized application state.
pub const STATE_KEY: &str = "SuccessListData";

/// Key holding the identity that was active last.
pub const LAST_USER_KEY: &str = "SuccessListLastUser";

/// Reads and writes `AppState` snapshots.
///
/// The state blob and the last-user marker are written as two separate keys.
/// There is no transaction across them: if the process stops between the two
/// writes, the marker can disagree with the `currentUser` embedded in the
/// blob. `load` prefers the marker, which covers the common case; full
/// consistency is not guaranteed.
#[derive(Debug)]
pub struct StatePersistence<S> {
    store: S,
}

impl<S: KeyValueStore> StatePersistence<S> {
    /// Creates a persistence adapter over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the persisted state.
    ///
    /// Never fails: a missing or unreadable blob yields a fresh default state.
    /// A valid last-user marker overrides the blob's embedded current user.
    pub async fn load(&self) -> AppState {
        let mut state = match self.store.get(STATE_KEY).await {
            Ok(Some(blob)) => match decode_state(&blob) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored state is unreadable, starting fresh");
                    AppState::default()
                }
            },
            Ok(None) => {
                tracing::debug!("No stored state, starting fresh");
                AppState::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored state, starting fresh");
                AppState::default()
            }
        };

        match self.store.get(LAST_USER_KEY).await {
            Ok(Some(raw)) => match UserName::parse(raw.trim()) {
                Some(name) => state.current_user = name,
                None => tracing::warn!(last_user = %raw, "Ignoring unknown last user"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read last user"),
        }

        state
    }

    /// Saves `state`: first the blob, then the last-user marker.
    ///
    /// Stops at the first failing write.
    pub async fn save(&self, state: &AppState) -> StoreResult<()> {
        let blob = encode_state(state)?;
        self.store.set(STATE_KEY, &blob).await?;
        self.store
            .set(LAST_USER_KEY, state.current_user.as_str())
            .await?;
        Ok(())
    }

    /// Removes both keys. In-memory state is not affected.
    pub async fn clear(&self) -> StoreResult<()> {
        self.store.remove(STATE_KEY).await?;
        self.store.remove(LAST_USER_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use entities::{Task, TaskCategory};
    use tokio_test::assert_ok;

    use super::*;
    use crate::MemoryKeyValueStore;

    fn sample_state() -> AppState {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
            + Duration::milliseconds(250);
        let mut state = AppState {
            current_user: UserName::Brittlyn,
            ..Default::default()
        };
        let stockton = state.user_mut(UserName::Stockton);
        stockton.tasks.push(
            Task::new("a".into(), "Write report", TaskCategory::Primary, created)
                .with_due_date(created + Duration::days(3)),
        );
        stockton.completed_tasks.push(
            Task::new("b".into(), "Book dentist", TaskCategory::Secondary, created)
                .complete(created + Duration::hours(5)),
        );
        state
            .user_mut(UserName::Brittlyn)
            .tasks
            .push(Task::new("c".into(), "Fix bike", TaskCategory::Secondary, created));
        state
    }

    #[tokio::test]
    async fn test_load_empty_store_returns_default() {
        let persistence = StatePersistence::new(MemoryKeyValueStore::new());
        assert_eq!(persistence.load().await, AppState::default());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let persistence = StatePersistence::new(MemoryKeyValueStore::new());
        let state = sample_state();

        assert_ok!(persistence.save(&state).await);
        let loaded = persistence.load().await;

        assert_eq!(loaded, state);
        let original = &state.user(UserName::Stockton).completed_tasks[0];
        let restored = &loaded.user(UserName::Stockton).completed_tasks[0];
        assert_eq!(restored.completed_at, original.completed_at);
        assert_eq!(
            persistence.store().get(LAST_USER_KEY).await.unwrap().as_deref(),
            Some("Brittlyn")
        );
    }

    #[tokio::test]
    async fn test_last_user_marker_overrides_blob() {
        let persistence = StatePersistence::new(MemoryKeyValueStore::new());
        persistence.save(&sample_state()).await.unwrap();

        // Simulates a crash after the marker write of a later save.
        persistence
            .store()
            .set(LAST_USER_KEY, "Stockton")
            .await
            .unwrap();

        let loaded = persistence.load().await;
        assert_eq!(loaded.current_user, UserName::Stockton);
        assert_eq!(loaded.user(UserName::Brittlyn).tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_last_user_is_ignored() {
        let persistence = StatePersistence::new(MemoryKeyValueStore::new());
        persistence.save(&sample_state()).await.unwrap();
        persistence
            .store()
            .set(LAST_USER_KEY, "Mallory")
            .await
            .unwrap();

        assert_eq!(persistence.load().await.current_user, UserName::Brittlyn);
    }

    #[tokio::test]
    async fn test_corrupt_blob_falls_back_to_default() {
        let persistence = StatePersistence::new(MemoryKeyValueStore::new());
        persistence.store().set(STATE_KEY, "{\"users\": [").await.unwrap();
        persistence
            .store()
            .set(LAST_USER_KEY, "Brittlyn")
            .await
            .unwrap();

        let loaded = persistence.load().await;
        assert_eq!(loaded.task_count(), 0);
        assert_eq!(loaded.current_user, UserName::Brittlyn);
    }

    #[tokio::test]
    async fn test_clear_removes_both_keys() {
        let persistence = StatePersistence::new(MemoryKeyValueStore::new());
        persistence.save(&sample_state()).await.unwrap();

        assert_ok!(persistence.clear().await);
        assert!(persistence.store().is_empty().await);
        assert_eq!(persistence.load().await, AppState::default());
    }
}
