//! Application state container.
//!
//! A single worker task owns every state transition. It hydrates from storage
//! once, then applies dispatched actions in the order they were submitted and
//! publishes each resulting snapshot on a watch channel. Changed snapshots are
//! handed to a second task that writes them out, so dispatching never waits on
//! storage.

use std::sync::Arc;

use chrono::Duration;
use entities::{AppState, TaskCategory, TaskId, UserName};
use task_store::{
    retention_period, retention_sweep_with, FileKeyValueStore, KeyValueStore, StatePersistence,
    StoreResult,
};
use tokio::{
    sync::{
        mpsc::{self, error::SendError},
        oneshot, watch,
    },
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{Action, Clock, Config, IdGenerator, Reducer, SystemClock, UuidGenerator};

/// Knobs for a `StateContainer`.
#[derive(Clone)]
pub struct ContainerOptions {
    /// Completed tasks older than this are dropped at hydration.
    pub retention_period: Duration,
    /// Time source for new tasks, completions and the sweep.
    pub clock: Arc<dyn Clock>,
    /// Id source for new tasks.
    pub ids: Arc<dyn IdGenerator>,
}

impl ContainerOptions {
    /// Options derived from a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            retention_period: config.retention_period(),
            ..Default::default()
        }
    }
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            retention_period: retention_period(),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidGenerator),
        }
    }
}

impl std::fmt::Debug for ContainerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerOptions")
            .field("retention_period", &self.retention_period)
            .finish_non_exhaustive()
    }
}

enum Command {
    Dispatch(Action),
    Flush(oneshot::Sender<()>),
}

enum SaveRequest {
    Snapshot(Arc<AppState>),
    Flush(oneshot::Sender<()>),
}

/// Owns the live application state and its persistence.
///
/// Must be created inside a tokio runtime.
pub struct StateContainer<S> {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Arc<AppState>>,
    hydrated: watch::Receiver<bool>,
    persistence: Arc<StatePersistence<S>>,
    worker: JoinHandle<()>,
    saver: JoinHandle<()>,
}

impl<S: KeyValueStore + 'static> StateContainer<S> {
    /// Creates the container and starts hydrating from `persistence`.
    pub fn new(persistence: StatePersistence<S>, options: ContainerOptions) -> Self {
        let persistence = Arc::new(persistence);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (saves_tx, saves_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(Arc::new(AppState::default()));
        let (hydrated_tx, hydrated_rx) = watch::channel(false);

        let worker = Worker {
            persistence: Arc::clone(&persistence),
            reducer: Reducer::new(options.clock, options.ids),
            retention_period: options.retention_period,
            commands: commands_rx,
            snapshots: snapshots_tx,
            hydrated: hydrated_tx,
            saves: saves_tx,
        };

        let worker = tokio::spawn(worker.run());
        let saver = tokio::spawn(run_saver(Arc::clone(&persistence), saves_rx));

        Self {
            commands: commands_tx,
            snapshots: snapshots_rx,
            hydrated: hydrated_rx,
            persistence,
            worker,
            saver,
        }
    }

    /// Enqueues an action. Never blocks.
    pub fn dispatch(&self, action: Action) {
        let name = action.name();
        if self.commands.send(Command::Dispatch(action)).is_err() {
            warn!(action = name, "State worker is gone, dropping action");
        }
    }

    /// Makes `name` the current user.
    pub fn switch_user(&self, name: UserName) {
        self.dispatch(Action::SwitchUser(name));
    }

    /// Makes the identity called `name` current. Unknown names are ignored.
    pub fn switch_user_by_name(&self, name: &str) {
        match name.parse::<UserName>() {
            Ok(user) => self.switch_user(user),
            Err(e) => warn!(user = %name, error = %e, "Ignoring switch to unknown user"),
        }
    }

    /// Adds an open task for the current user.
    pub fn add_task(
        &self,
        text: impl Into<String>,
        category: TaskCategory,
        due_date: Option<chrono::DateTime<chrono::Utc>>,
    ) {
        self.dispatch(Action::AddTask {
            text: text.into(),
            category,
            due_date,
        });
    }

    /// Completes an open task of the current user.
    pub fn complete_task(&self, id: TaskId) {
        self.dispatch(Action::CompleteTask(id));
    }

    /// Deletes an open task of the current user.
    pub fn delete_task(&self, id: TaskId) {
        self.dispatch(Action::DeleteTask(id));
    }

    /// Returns the latest published snapshot.
    pub fn snapshot(&self) -> Arc<AppState> {
        self.snapshots.borrow().clone()
    }

    /// Returns a receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.snapshots.clone()
    }

    /// Whether the stored state has been loaded.
    pub fn is_hydrated(&self) -> bool {
        *self.hydrated.borrow()
    }

    /// Waits until the stored state has been loaded.
    pub async fn wait_until_hydrated(&self) {
        let mut hydrated = self.hydrated.clone();
        if hydrated.wait_for(|done| *done).await.is_err() {
            warn!("State worker stopped before hydration");
        }
    }

    /// Waits until every action dispatched so far is applied and the
    /// resulting snapshots are saved.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.commands.send(Command::Flush(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }

    /// Removes the persisted state. The in-memory state is left as is.
    pub async fn clear_storage(&self) -> StoreResult<()> {
        self.persistence.clear().await
    }

    /// Stops accepting actions and waits for pending work and saves.
    pub async fn shutdown(self) {
        let Self {
            commands,
            worker,
            saver,
            ..
        } = self;
        drop(commands);

        if let Err(e) = worker.await {
            error!(error = %e, "State worker failed");
        }
        if let Err(e) = saver.await {
            error!(error = %e, "State saver failed");
        }
        debug!("State container shut down");
    }
}

impl StateContainer<FileKeyValueStore> {
    /// Creates a file-backed container from a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let store = FileKeyValueStore::new(&config.data_dir);
        Self::new(
            StatePersistence::new(store),
            ContainerOptions::from_config(config),
        )
    }
}

/// Single mutator of the application state.
struct Worker<S> {
    persistence: Arc<StatePersistence<S>>,
    reducer: Reducer,
    retention_period: Duration,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<Arc<AppState>>,
    hydrated: watch::Sender<bool>,
    saves: mpsc::UnboundedSender<SaveRequest>,
}

impl<S: KeyValueStore> Worker<S> {
    async fn run(mut self) {
        self.hydrate().await;

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Dispatch(action) => {
                    let name = action.name();
                    let current = self.snapshots.borrow().clone();
                    let next = self.reducer.reduce(&current, action);

                    if Arc::ptr_eq(&current, &next) {
                        debug!(action = name, "Action left state unchanged");
                        continue;
                    }

                    debug!(
                        action = name,
                        user = %next.current_user,
                        open = next.current().tasks.len(),
                        completed = next.current().completed_tasks.len(),
                        "Applied action"
                    );
                    self.publish(next);
                }
                Command::Flush(done) => {
                    if let Err(SendError(SaveRequest::Flush(done))) =
                        self.saves.send(SaveRequest::Flush(done))
                    {
                        let _ = done.send(());
                    }
                }
            }
        }

        debug!("State worker stopped");
    }

    async fn hydrate(&mut self) {
        let loaded = Arc::new(self.persistence.load().await);
        let swept = retention_sweep_with(&loaded, self.reducer.now(), self.retention_period);

        let current = self.snapshots.borrow().clone();
        let state = self.reducer.reduce(&current, Action::SetState(swept));

        info!(
            user = %state.current_user,
            tasks = state.task_count(),
            evicted = loaded.task_count() - state.task_count(),
            "Hydrated state"
        );

        self.publish(state);
        self.hydrated.send_replace(true);
    }

    fn publish(&self, state: Arc<AppState>) {
        self.snapshots.send_replace(Arc::clone(&state));
        if self.saves.send(SaveRequest::Snapshot(state)).is_err() {
            warn!("State saver is gone, snapshot not saved");
        }
    }
}

/// Saves snapshots one at a time, in the order they were published.
async fn run_saver<S: KeyValueStore>(
    persistence: Arc<StatePersistence<S>>,
    mut requests: mpsc::UnboundedReceiver<SaveRequest>,
) {
    while let Some(request) = requests.recv().await {
        match request {
            SaveRequest::Snapshot(state) => {
                if let Err(e) = persistence.save(&state).await {
                    error!(error = %e, "Failed to save state");
                }
            }
            SaveRequest::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("State saver stopped");
}
