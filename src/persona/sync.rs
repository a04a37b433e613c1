use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info};

use super::record::PersonaRecord;
use super::state::{CloseOutcome, EditMode, PersonaSyncState, PollOutcome, SaveStatus};
use crate::config::PersonaConfig;
use crate::error::{ClientError, EditError};
use crate::http::BackendClient;

fn lock_state(state: &Mutex<PersonaSyncState>) -> MutexGuard<'_, PersonaSyncState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs the poll loop and the edit/save path over one shared state.
///
/// The lock is never held across a network call: fetches and saves run
/// unlocked, and their results go through the state's transitions, which
/// apply the mode check at the moment of mutation.
#[derive(Clone)]
pub struct PersonaSync {
    backend: BackendClient,
    state: Arc<Mutex<PersonaSyncState>>,
    poll_interval: Duration,
    status_reset_delay: Duration,
}

/// Stops the poll loop when stopped or dropped
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A save whose outcome has not been recorded yet.
///
/// Dropping it unfinished (the save future was cancelled) records a
/// failure, so the status can never stay at `Saving`.
struct InFlightSave<'a> {
    sync: &'a PersonaSync,
    sent: Option<PersonaRecord>,
}

impl InFlightSave<'_> {
    fn finish(mut self, succeeded: bool) {
        if let Some(sent) = self.sent.take() {
            self.sync.complete_save(sent, succeeded);
        }
    }
}

impl Drop for InFlightSave<'_> {
    fn drop(&mut self) {
        if let Some(sent) = self.sent.take() {
            self.sync.complete_save(sent, false);
        }
    }
}

impl PersonaSync {
    pub fn new(backend: BackendClient, config: &PersonaConfig) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(PersonaSyncState::new())),
            poll_interval: config.poll_interval(),
            status_reset_delay: config.status_reset_delay(),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> PersonaSyncState {
        lock_state(&self.state).clone()
    }

    pub fn mode(&self) -> EditMode {
        lock_state(&self.state).mode()
    }

    pub fn save_status(&self) -> SaveStatus {
        lock_state(&self.state).save_status()
    }

    /// Fetch the remote record once and apply it unless editing, or unless
    /// an edit began or a save landed while the request was out
    pub async fn refresh(&self) -> Result<PollOutcome, ClientError> {
        let generation = lock_state(&self.state).sync_generation();
        let fetched = self.backend.fetch_persona().await?;
        Ok(lock_state(&self.state).apply_poll_since(generation, fetched, Utc::now()))
    }

    /// Poll immediately, then every `poll_interval`, until the handle goes away
    pub fn spawn_poller(&self) -> PollerHandle {
        let sync = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval(sync.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match sync.refresh().await {
                    Ok(outcome) => debug!("Persona poll: {:?}", outcome),
                    Err(e) => error!("Error loading user persona: {}", e),
                }
            }
        });

        info!("Persona polling every {:?}", self.poll_interval);
        PollerHandle { task }
    }

    pub fn begin_editing(&self) -> Result<(), EditError> {
        lock_state(&self.state).begin_editing()
    }

    pub fn toggle_edit_mode(&self) -> Result<EditMode, EditError> {
        lock_state(&self.state).toggle_edit_mode()
    }

    pub fn change_field(&self, key: &str, raw: &str) -> Result<(), EditError> {
        lock_state(&self.state).change_field(key, raw)
    }

    pub fn cancel_editing(&self) -> bool {
        lock_state(&self.state).cancel_editing()
    }

    pub fn request_close(&self, confirm: impl FnOnce() -> bool) -> CloseOutcome {
        lock_state(&self.state).request_close(confirm)
    }

    /// Send the draft and settle on `Saved` or `Error`.
    ///
    /// On failure the draft and edit mode are kept. Either status reverts
    /// to `Idle` after the configured delay.
    pub async fn save(&self) -> Result<SaveStatus, EditError> {
        let sent = lock_state(&self.state).begin_save()?;
        let in_flight = InFlightSave {
            sync: self,
            sent: Some(sent.clone()),
        };

        let result = self.backend.update_persona(&sent).await;
        if let Err(e) = &result {
            error!("Error saving persona: {}", e);
        }
        in_flight.finish(result.is_ok());

        Ok(self.save_status())
    }

    fn complete_save(&self, sent: PersonaRecord, succeeded: bool) {
        let epoch = lock_state(&self.state).complete_save(sent, succeeded);
        self.schedule_status_reset(epoch);
    }

    fn schedule_status_reset(&self, epoch: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let state = Arc::clone(&self.state);
        let delay = self.status_reset_delay;
        runtime.spawn(async move {
            sleep(delay).await;
            lock_state(&state).reset_save_status(epoch);
        });
    }
}
