use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::clock::Clock;
use super::replay::ReplayBackend;
use super::sample::RawSample;
use super::simulated::SimulatedBackend;
use crate::error::Result;

/// Positioning sensor backend trait
///
/// Implementations:
/// - Simulated: synthetic walk at a fixed interval (demo/testing)
/// - Replay: re-emit a previously recorded session log
#[async_trait::async_trait]
pub trait LocationBackend: Send + Sync {
    /// Start delivering location updates
    ///
    /// Fails with `RecorderError::PermissionDenied` when the sensor may not be
    /// read. On success returns the receiver raw samples arrive on.
    async fn start(&mut self) -> Result<mpsc::Receiver<RawSample>>;

    /// Stop delivering location updates
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently delivering
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Configuration for the simulated backend
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// Time between two samples
    pub interval: Duration,
    pub origin_latitude: f64,
    pub origin_longitude: f64,
    /// Walking speed in m/s
    pub speed_mps: f32,
    /// Direction of travel in degrees
    pub bearing_deg: f32,
    /// When false, `start()` fails with `PermissionDenied`
    pub permission_granted: bool,
    /// Stop emitting (and end the stream) after this many samples
    pub max_samples: Option<usize>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            origin_latitude: 52.520008,
            origin_longitude: 13.404954,
            speed_mps: 1.4,
            bearing_deg: 45.0,
            permission_granted: true,
            max_samples: None,
        }
    }
}

/// Configuration for the replay backend
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Session log (or compatible CSV) to replay
    pub path: PathBuf,
    /// Playback speed factor (2.0 = twice as fast as recorded)
    pub speed: f64,
}

/// Which backend to build
#[derive(Debug, Clone)]
pub enum SourceKind {
    Simulated(SimulatedConfig),
    Replay(ReplayConfig),
}

/// Location backend factory
pub struct LocationBackendFactory;

impl LocationBackendFactory {
    pub fn create(kind: SourceKind, clock: Arc<dyn Clock>) -> Box<dyn LocationBackend> {
        match kind {
            SourceKind::Simulated(config) => Box::new(SimulatedBackend::new(config, clock)),
            SourceKind::Replay(config) => Box::new(ReplayBackend::new(config, clock)),
        }
    }
}
