use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backend::LocationBackend;
use super::clock::reconcile;
use super::feed::{SampleFeed, SampleSubscription};
use super::sample::{RawSample, ReconciledSample};
use crate::error::Result;
use crate::recording::Session;

/// Lifecycle of the location source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePhase {
    Stopped,
    Requesting,
    Active,
}

struct Pump {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

struct SourceInner {
    backend: Box<dyn LocationBackend>,
    pump: Option<Pump>,
}

/// Long-running location source
///
/// Owns the sensor backend and forwards its readings, reconciled to UTC with
/// the session offset, onto a replay-1 broadcast feed. Emission runs on its
/// own task and keeps going whether or not anyone is subscribed.
pub struct LocationSource {
    inner: Mutex<SourceInner>,
    feed: SampleFeed,
    phase: watch::Sender<SourcePhase>,
}

impl LocationSource {
    pub fn new(backend: Box<dyn LocationBackend>, feed_capacity: usize) -> Self {
        let (phase, _) = watch::channel(SourcePhase::Stopped);
        Self {
            inner: Mutex::new(SourceInner {
                backend,
                pump: None,
            }),
            feed: SampleFeed::new(feed_capacity),
            phase,
        }
    }

    pub fn phase(&self) -> SourcePhase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SourcePhase> {
        self.phase.subscribe()
    }

    pub fn feed(&self) -> &SampleFeed {
        &self.feed
    }

    /// Subscribe to reconciled samples (latest sample replayed first)
    pub fn subscribe(&self) -> SampleSubscription {
        self.feed.subscribe()
    }

    pub fn latest(&self) -> Option<ReconciledSample> {
        self.feed.latest()
    }

    /// Start emitting samples for `session`
    ///
    /// A no-op while already active. Fails with `PermissionDenied` (and stays
    /// stopped) when the backend refuses to deliver.
    pub async fn start(&self, session: &Session) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if self.phase() == SourcePhase::Active {
            let running = inner.pump.as_ref().is_some_and(|p| !p.handle.is_finished());
            if running {
                debug!("Location source already active, ignoring start");
                return Ok(());
            }
            debug!("Previous sensor stream ended on its own, restarting");
            self.shutdown(&mut inner).await;
        }

        self.phase.send_replace(SourcePhase::Requesting);
        info!(
            "Requesting location updates from {} backend (session {})",
            inner.backend.name(),
            session.id
        );

        let rx = match inner.backend.start().await {
            Ok(rx) => rx,
            Err(e) => {
                warn!("Location source failed to start: {}", e);
                self.phase.send_replace(SourcePhase::Stopped);
                return Err(e);
            }
        };

        self.feed.reset();
        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(pump(rx, stop_rx, session.offset_ns(), self.feed.clone()));

        inner.pump = Some(Pump { stop_tx, handle });
        self.phase.send_replace(SourcePhase::Active);
        info!("Location source active");

        Ok(())
    }

    /// Stop emitting
    ///
    /// Returns once every reading the backend already delivered has been
    /// published and subscribers have been told the session ended.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if self.phase() == SourcePhase::Stopped {
            return;
        }
        self.shutdown(&mut inner).await;
        info!("Location source stopped");
    }

    async fn shutdown(&self, inner: &mut SourceInner) {
        if let Err(e) = inner.backend.stop().await {
            error!("Failed to stop {} backend: {}", inner.backend.name(), e);
        }

        if let Some(pump) = inner.pump.take() {
            let _ = pump.stop_tx.send(());
            if let Err(e) = pump.handle.await {
                error!("Location pump task panicked: {}", e);
            }
        }

        self.phase.send_replace(SourcePhase::Stopped);
    }
}

async fn pump(
    mut rx: mpsc::Receiver<RawSample>,
    mut stop_rx: oneshot::Receiver<()>,
    offset_ns: i64,
    feed: SampleFeed,
) {
    let mut forwarded: usize = 0;

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => {
                while let Ok(raw) = rx.try_recv() {
                    feed.publish(reconcile(raw, offset_ns));
                    forwarded += 1;
                }
                break;
            }
            next = rx.recv() => match next {
                Some(raw) => {
                    feed.publish(reconcile(raw, offset_ns));
                    forwarded += 1;
                }
                None => {
                    info!("Sensor stream ended");
                    break;
                }
            }
        }
    }

    feed.end_session();
    debug!("Location pump finished after {} samples", forwarded);
}
