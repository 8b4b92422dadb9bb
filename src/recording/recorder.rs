use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::RecorderConfig;
use super::session::Session;
use super::status::{format_elapsed, Phase, RecordingState, RecordingStatus};
use crate::error::{RecorderError, Result};
use crate::events::{
    Event, EventNotifier, NoopNotifier, ReverseGeocoder, BEGIN_EVENT_NAME, DEFAULT_EVENT_NAME,
    END_EVENT_NAME,
};
use crate::location::{Clock, LocationSource, ReconciledSample};
use crate::pipeline::{spawn_consumer, ConsumerReport, SessionLogWriter, SessionStore};
use crate::remote::ToggleCoordinator;

const EVENT_CAPACITY: usize = 16;

/// Domain events published on every transition
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    Started {
        session_id: Uuid,
        log_path: PathBuf,
    },
    /// `log_path` is `None` when the session could not be persisted
    Stopped {
        session_id: Uuid,
        log_path: Option<PathBuf>,
        sample_count: u32,
    },
}

/// Result of a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: Uuid,
    /// `None` when persistence failed
    pub log_path: Option<PathBuf>,
    /// Samples received during the session
    pub sample_count: u32,
    /// Data lines in the session log
    pub samples_written: usize,
    /// Batches the consumer confirmed; 0 when it was cancelled on drain timeout
    pub batches_written: usize,
    pub elapsed_secs: u64,
}

/// What a toggle did
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Started { session_id: Uuid, log_path: PathBuf },
    Stopped(SessionSummary),
}

struct ActiveSession {
    session: Session,
    log_path: PathBuf,
    started: Instant,
    consumer: JoinHandle<ConsumerReport>,
    ticker: JoinHandle<()>,
}

enum MachineState {
    Idle,
    Recording(ActiveSession),
}

/// Recording state machine
///
/// `toggle()` flips between Idle and Recording. Transitions are serialized by
/// an async mutex, so a local caller and a remote trigger never interleave.
pub struct Recorder {
    config: RecorderConfig,
    output_dir: RwLock<PathBuf>,
    clock: Arc<dyn Clock>,
    source: Arc<LocationSource>,
    store: SessionStore,
    notifier: Arc<dyn EventNotifier>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    state: Mutex<MachineState>,
    status: Arc<watch::Sender<RecordingStatus>>,
    events: broadcast::Sender<RecorderEvent>,
}

impl Recorder {
    /// Fails with `InvalidArgument` when `chunk_size` is zero
    pub fn new(
        config: RecorderConfig,
        source: Arc<LocationSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(RecorderError::InvalidArgument(
                "chunk size must be greater than 0".to_string(),
            ));
        }

        let (status, _) = watch::channel(RecordingStatus::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            "Recorder initialized: output {:?}, chunk size {}",
            config.output_dir, config.chunk_size
        );

        Ok(Self {
            output_dir: RwLock::new(config.output_dir.clone()),
            config,
            clock,
            source,
            store: SessionStore::new(),
            notifier: Arc::new(NoopNotifier),
            geocoder: None,
            state: Mutex::new(MachineState::Idle),
            status: Arc::new(status),
            events,
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self) -> RecordingState {
        let status = self.status.borrow();
        RecordingState {
            phase: status.phase,
            sample_count: self.store.count() as u32,
            session_log_path: status.session_log_path.clone(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.status.borrow().phase
    }

    /// Current status with a live sample count
    pub fn status(&self) -> RecordingStatus {
        let mut status = self.status.borrow().clone();
        if status.phase == Phase::Recording {
            status.sample_count = self.store.count() as u32;
        }
        status
    }

    pub fn watch_status(&self) -> watch::Receiver<RecordingStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<RecorderEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn latest_sample(&self) -> Option<ReconciledSample> {
        self.store.latest()
    }

    pub fn sample_count(&self) -> usize {
        self.store.count()
    }

    pub fn samples(&self) -> Vec<ReconciledSample> {
        self.store.all()
    }

    /// Directory the next session log will be created in
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Change where future session logs go; a running session is unaffected
    pub fn set_output_dir(&self, dir: impl AsRef<Path>) {
        let dir = dir.as_ref().to_path_buf();
        info!("Output directory set to {:?}", dir);
        *self
            .output_dir
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = dir;
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Flip between Idle and Recording
    ///
    /// Starting fails (and leaves the recorder Idle) when the location source
    /// is denied or the session log cannot be created. Stopping always
    /// succeeds; a session that could not be persisted reports no log path.
    pub async fn toggle(&self) -> Result<ToggleOutcome> {
        let mut state = self.state.lock().await;
        info!("Toggling GPS recording state");

        match std::mem::replace(&mut *state, MachineState::Idle) {
            MachineState::Idle => {
                let active = self.start_session().await?;
                let outcome = ToggleOutcome::Started {
                    session_id: active.session.id,
                    log_path: active.log_path.clone(),
                };
                *state = MachineState::Recording(active);
                self.notify(Event::new(BEGIN_EVENT_NAME)).await;
                Ok(outcome)
            }
            MachineState::Recording(active) => {
                let summary = self.stop_session(active).await;
                self.notify(Event::new(END_EVENT_NAME)).await;
                Ok(ToggleOutcome::Stopped(summary))
            }
        }
    }

    async fn start_session(&self) -> Result<ActiveSession> {
        let output_dir = self.output_dir();
        let session = Session::begin(self.clock.as_ref());
        info!("Starting recording session {}", session.id);

        // Subscribe before the source starts so the consumer misses nothing.
        let subscription = self.source.subscribe();
        self.source.start(&session).await?;

        let writer = match SessionLogWriter::open(&output_dir, &session) {
            Ok(writer) => writer,
            Err(e) => {
                error!("Failed to open session log in {:?}: {}", output_dir, e);
                self.source.stop().await;
                return Err(e);
            }
        };
        let log_path = writer.path().to_path_buf();

        self.store.clear();
        let consumer = match spawn_consumer(
            subscription,
            self.config.chunk_size,
            self.store.clone(),
            writer,
        ) {
            Ok(consumer) => consumer,
            Err(e) => {
                self.source.stop().await;
                return Err(e);
            }
        };

        let started = Instant::now();
        let ticker = self.spawn_ticker(started);

        self.status.send_modify(|status| {
            status.phase = Phase::Recording;
            status.session_id = Some(session.id);
            status.sample_count = 0;
            status.session_log_path = Some(log_path.clone());
            status.elapsed_secs = 0;
            status.elapsed = format_elapsed(0);
            status.status_message = "Recording started...".to_string();
            status.saved_message = String::new();
        });

        let _ = self.events.send(RecorderEvent::Started {
            session_id: session.id,
            log_path: log_path.clone(),
        });
        info!("Recording session {} started: {:?}", session.id, log_path);

        Ok(ActiveSession {
            session,
            log_path,
            started,
            consumer,
            ticker,
        })
    }

    async fn stop_session(&self, active: ActiveSession) -> SessionSummary {
        let session_id = active.session.id;
        info!("Stopping recording session {}", session_id);

        // Source first: no new samples, and subscribers see end of session.
        self.source.stop().await;

        active.ticker.abort();
        let _ = active.ticker.await;
        let elapsed_secs = active.started.elapsed().as_secs();

        let (log_path, samples_written, batches_written) =
            self.drain_consumer(active.consumer, active.log_path).await;

        let sample_count = self.store.count() as u32;
        self.store.clear();

        self.status.send_modify(|status| {
            status.phase = Phase::Idle;
            status.session_id = None;
            status.sample_count = 0;
            status.session_log_path = None;
            status.elapsed_secs = 0;
            status.elapsed = format_elapsed(0);
            status.total_samples_collected = sample_count;
            status.status_message = "Recording stopped!".to_string();
            status.saved_message = match &log_path {
                Some(path) => format!("Saved to:\n{}", path.display()),
                None => "Save failed".to_string(),
            };
        });

        let _ = self.events.send(RecorderEvent::Stopped {
            session_id,
            log_path: log_path.clone(),
            sample_count,
        });
        info!(
            "Recording session {} stopped: {} samples, log {:?}",
            session_id, sample_count, log_path
        );

        SessionSummary {
            session_id,
            log_path,
            sample_count,
            samples_written,
            batches_written,
            elapsed_secs,
        }
    }

    /// Wait for the consumer to flush what the source already emitted, then
    /// close the session log
    async fn drain_consumer(
        &self,
        mut consumer: JoinHandle<ConsumerReport>,
        log_path: PathBuf,
    ) -> (Option<PathBuf>, usize, usize) {
        match tokio::time::timeout(self.config.drain_timeout, &mut consumer).await {
            Ok(Ok(mut report)) => {
                let samples_written = report.writer.samples_written();
                let closed = report.writer.close();
                let path = match closed {
                    Ok(()) if !report.write_failed => Some(log_path),
                    Ok(()) => {
                        warn!("Session log {:?} is incomplete", log_path);
                        None
                    }
                    Err(e) => {
                        error!("Failed to close session log {:?}: {}", log_path, e);
                        None
                    }
                };
                (path, samples_written, report.batches_written)
            }
            Ok(Err(e)) => {
                error!("Batch consumer task failed: {}", e);
                (None, 0, 0)
            }
            Err(_) => {
                // Flushed lines stay on disk; only the in-flight batch is lost.
                warn!(
                    "Batch consumer did not drain within {:?}, cancelling",
                    self.config.drain_timeout
                );
                consumer.abort();
                let _ = consumer.await;

                match SessionLogWriter::recover(&log_path) {
                    Ok(samples_written) => (Some(log_path), samples_written, 0),
                    Err(e) => {
                        error!("Failed to sync session log {:?}: {}", log_path, e);
                        (None, 0, 0)
                    }
                }
            }
        }
    }

    fn spawn_ticker(&self, started: Instant) -> JoinHandle<()> {
        let status = Arc::clone(&self.status);
        let store = self.store.clone();
        let period = self.config.tick_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let elapsed = started.elapsed().as_secs();
                let count = store.count() as u32;
                status.send_modify(|s| {
                    s.elapsed_secs = elapsed;
                    s.elapsed = format_elapsed(elapsed);
                    s.sample_count = count;
                });
            }
        })
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Send a named event
    ///
    /// Without a custom name the latest sample is reverse-geocoded; when that
    /// is unavailable the default name is used. Delivery is best effort.
    pub async fn send_event(&self, custom_name: Option<String>) -> Event {
        let name = match custom_name {
            Some(name) => name,
            None => self.name_from_latest_sample().await,
        };

        let event = Event::new(name);
        self.notify(event.clone()).await;
        event
    }

    async fn name_from_latest_sample(&self) -> String {
        let Some(geocoder) = &self.geocoder else {
            return DEFAULT_EVENT_NAME.to_string();
        };
        let Some(sample) = self.store.latest() else {
            debug!("No sample to geocode yet");
            return DEFAULT_EVENT_NAME.to_string();
        };

        match geocoder
            .reverse_geocode(sample.latitude, sample.longitude)
            .await
        {
            Ok(Some(address)) => {
                debug!("Geocoding successful: {}", address);
                address
            }
            Ok(None) => DEFAULT_EVENT_NAME.to_string(),
            Err(e) => {
                debug!("No geocoding available: {}", e);
                DEFAULT_EVENT_NAME.to_string()
            }
        }
    }

    async fn notify(&self, event: Event) {
        match tokio::time::timeout(self.config.notify_timeout, self.notifier.notify(&event)).await
        {
            Ok(Ok(())) => debug!("Event {} delivered", event.name),
            Ok(Err(e)) => warn!("Failed to deliver event {}: {}", event.name, e),
            Err(_) => warn!("Event {} timed out", event.name),
        }
    }

    // ------------------------------------------------------------------
    // Remote control
    // ------------------------------------------------------------------

    /// Register this recorder as the coordinator's toggle handler
    ///
    /// Each trigger spawns a toggle on the current tokio runtime. The
    /// coordinator only keeps a weak reference.
    pub fn attach(self: &Arc<Self>, coordinator: &ToggleCoordinator) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            RecorderError::InvalidArgument(format!("attach needs a tokio runtime: {}", e))
        })?;
        let recorder = Arc::downgrade(self);

        coordinator.register(move || {
            let Some(recorder) = recorder.upgrade() else {
                warn!("Remote toggle received but the recorder is gone");
                return;
            };
            info!("Remote toggle received");
            runtime.spawn(async move {
                match recorder.toggle().await {
                    Ok(ToggleOutcome::Started { session_id, .. }) => {
                        info!("Remote toggle started session {}", session_id)
                    }
                    Ok(ToggleOutcome::Stopped(summary)) => {
                        info!("Remote toggle stopped session {}", summary.session_id)
                    }
                    Err(e) => error!("Remote toggle failed: {}", e),
                }
            });
        });

        Ok(())
    }

    pub fn detach(&self, coordinator: &ToggleCoordinator) {
        coordinator.unregister();
    }
}
