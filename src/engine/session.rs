use chrono::Utc;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::context::RunContext;
use super::error::SpeedTestError;
use super::events::Events;
use super::latency::sample_latency;
use super::metadata::fetch_connection_info;
use super::quality::assess;
use super::selector::select_server;
use super::store::{ResultStore, SavedResult};
use super::trials::run_trials;
use super::types::{
    ResultSet, SessionEvent, SessionOutcome, SessionReport, SessionState, SpeedTestConfig, Stage,
    TestType,
};

struct ActiveSession {
    id: u64,
    token: CancellationToken,
}

/// Drives one measurement session at a time through server selection,
/// latency, download, upload and the optional connection lookup.
///
/// Observers attach with [`SpeedTest::subscribe`]. A session is started with
/// [`SpeedTest::run`] or [`SpeedTest::start`]; asking for another one while a
/// session is active does nothing.
pub struct SpeedTest {
    client: Client,
    config: Arc<SpeedTestConfig>,
    store: Option<Arc<dyn ResultStore>>,
    events: Events,
    state: Mutex<SessionState>,
    active: Mutex<Option<ActiveSession>>,
    next_id: AtomicU64,
}

impl SpeedTest {
    pub fn new(client: Client, config: SpeedTestConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
            store: None,
            events: Events::new(),
            state: Mutex::new(SessionState::Idle),
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Persist every completed session to `store`.
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &SpeedTestConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    pub fn is_running(&self) -> bool {
        lock(&self.active).is_some()
    }

    /// Run a session to completion on the current task.
    ///
    /// Returns `None` without doing anything if a session is already active.
    pub async fn run(&self) -> Option<SessionOutcome> {
        let (id, ctx) = self.activate()?;
        Some(self.drive(id, ctx).await)
    }

    /// Spawn a session onto the runtime. `None` if one is already active.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<SessionOutcome>> {
        let (id, ctx) = self.activate()?;
        let this = Arc::clone(self);
        Some(tokio::spawn(async move { this.drive(id, ctx).await }))
    }

    /// Stop the active session, if any.
    ///
    /// The run slot is released right away so a new session may start while
    /// the cancelled one is still unwinding.
    pub fn cancel(&self) {
        let mut active = lock(&self.active);
        let Some(session) = active.take() else {
            return;
        };
        session.token.cancel();
        *lock(&self.state) = SessionState::Aborted;
        drop(active);

        info!("Session {} cancelled", session.id);
        self.events.emit(SessionEvent::Aborted);
    }

    fn activate(&self) -> Option<(u64, RunContext)> {
        let mut active = lock(&self.active);
        if active.is_some() {
            warn!("A session is already running, ignoring start request");
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let ctx = RunContext::new(
            self.client.clone(),
            Arc::clone(&self.config),
            self.events.clone(),
        );
        *active = Some(ActiveSession {
            id,
            token: ctx.token.clone(),
        });
        *lock(&self.state) = SessionState::Selecting;
        Some((id, ctx))
    }

    async fn drive(&self, id: u64, ctx: RunContext) -> SessionOutcome {
        info!("Session {id} started");
        let result = self.execute(id, &ctx).await;
        self.conclude(id, result).await
    }

    /// Record how the session ended. Nothing is written, saved or emitted for
    /// a session that was cancelled in the meantime.
    async fn conclude(
        &self,
        id: u64,
        result: Result<SessionReport, SpeedTestError>,
    ) -> SessionOutcome {
        match result {
            Ok(report) => {
                if !self.finish(id, SessionState::Complete) {
                    return SessionOutcome::Aborted;
                }
                if let Some(store) = &self.store {
                    persist(Arc::clone(store), SavedResult::from(&report)).await;
                }
                info!("Session {id} complete");
                self.events.emit(SessionEvent::Complete(Box::new(report.clone())));
                SessionOutcome::Completed(Box::new(report))
            }
            Err(SpeedTestError::Cancelled) => {
                // cancel() has already reported the abort and released the slot
                if self.finish(id, SessionState::Aborted) {
                    self.events.emit(SessionEvent::Aborted);
                }
                SessionOutcome::Aborted
            }
            Err(e) => {
                let message = e.to_string();
                if !self.finish(id, SessionState::Failed) {
                    return SessionOutcome::Aborted;
                }
                error!("Session {id} failed: {message}");
                self.events.emit(SessionEvent::Error(message.clone()));
                SessionOutcome::Failed(message)
            }
        }
    }

    async fn execute(&self, id: u64, ctx: &RunContext) -> Result<SessionReport, SpeedTestError> {
        ctx.config.validate()?;

        self.advance(id, SessionState::Selecting, Stage::ServerSelection, ctx)?;
        let endpoint = select_server(ctx).await?;
        ctx.events.emit(SessionEvent::ServerSelected(endpoint.clone()));

        self.advance(id, SessionState::Latency, Stage::Latency, ctx)?;
        let latency = sample_latency(ctx, &endpoint).await?;

        self.advance(id, SessionState::Downloading, Stage::Download, ctx)?;
        let download = run_trials(ctx, &endpoint, TestType::Download).await?;

        self.advance(id, SessionState::Uploading, Stage::Upload, ctx)?;
        let upload = run_trials(ctx, &endpoint, TestType::Upload).await?;

        let connection_info = if ctx.config.lookup_metadata {
            self.advance(id, SessionState::MetadataLookup, Stage::ConnectionInfo, ctx)?;
            Some(fetch_connection_info(ctx).await?)
        } else {
            None
        };
        ctx.checkpoint()?;

        let results = ResultSet {
            download: download.mbps,
            upload: upload.mbps,
            ping: latency.ping_ms,
            jitter: latency.jitter_ms,
        };
        let quality = assess(&results);

        Ok(SessionReport {
            timestamp: Utc::now(),
            endpoint,
            results,
            latency,
            download,
            upload,
            connection_info,
            quality,
        })
    }

    /// Enter the next phase unless this session has been superseded.
    fn advance(
        &self,
        id: u64,
        state: SessionState,
        stage: Stage,
        ctx: &RunContext,
    ) -> Result<(), SpeedTestError> {
        ctx.checkpoint()?;
        {
            let active = lock(&self.active);
            if !is_current(&active, id) {
                return Err(SpeedTestError::Cancelled);
            }
            *lock(&self.state) = state;
        }
        ctx.events.stage(stage);
        Ok(())
    }

    /// Release the run slot and record the terminal state. Returns false when
    /// the session was already superseded, in which case nothing is written.
    fn finish(&self, id: u64, state: SessionState) -> bool {
        let mut active = lock(&self.active);
        if !is_current(&active, id) {
            return false;
        }
        *active = None;
        *lock(&self.state) = state;
        true
    }
}

/// Stores may touch the filesystem, so saving runs on the blocking pool.
async fn persist(store: Arc<dyn ResultStore>, record: SavedResult) {
    match tokio::task::spawn_blocking(move || store.save(&record)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to save results: {e}"),
        Err(e) => warn!("Result save task failed: {e}"),
    }
}

fn is_current(active: &Option<ActiveSession>, id: u64) -> bool {
    active.as_ref().is_some_and(|s| s.id == id)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
