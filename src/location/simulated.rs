// Simulated positioning sensor
//
// Walks in a straight line from a configured origin, one sample per interval,
// stamped with the shared monotonic clock.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{LocationBackend, SimulatedConfig};
use super::clock::Clock;
use super::sample::RawSample;
use crate::error::{RecorderError, Result};

const METERS_PER_DEGREE: f64 = 111_320.0;
const CHANNEL_CAPACITY: usize = 256;

pub struct SimulatedBackend {
    config: SimulatedConfig,
    clock: Arc<dyn Clock>,
    task: Option<JoinHandle<()>>,
}

impl SimulatedBackend {
    pub fn new(config: SimulatedConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            task: None,
        }
    }

    /// Position after `step` intervals of travel
    fn position_at(config: &SimulatedConfig, step: u64) -> (f64, f64) {
        let distance =
            f64::from(config.speed_mps) * config.interval.as_secs_f64() * step as f64;
        let bearing = f64::from(config.bearing_deg).to_radians();
        let lat_scale = config.origin_latitude.to_radians().cos().abs().max(1e-6);

        let latitude = config.origin_latitude + distance * bearing.cos() / METERS_PER_DEGREE;
        let longitude =
            config.origin_longitude + distance * bearing.sin() / (METERS_PER_DEGREE * lat_scale);

        (latitude, longitude)
    }
}

#[async_trait::async_trait]
impl LocationBackend for SimulatedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<RawSample>> {
        if !self.config.permission_granted {
            warn!("Simulated sensor: location permission denied");
            return Err(RecorderError::PermissionDenied);
        }

        if self.task.is_some() {
            return Err(RecorderError::InvalidArgument(
                "simulated sensor already delivering".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let config = self.config.clone();
        let clock = Arc::clone(&self.clock);

        info!(
            "Simulated sensor started ({:?} interval, origin {:.6},{:.6})",
            config.interval, config.origin_latitude, config.origin_longitude
        );

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            let mut step: u64 = 0;

            loop {
                if let Some(max) = config.max_samples {
                    if step as usize >= max {
                        info!("Simulated sensor reached {} samples", max);
                        break;
                    }
                }

                ticker.tick().await;

                let (latitude, longitude) = Self::position_at(&config, step);
                let sample = RawSample {
                    monotonic_timestamp_ns: clock.monotonic_now_ns(),
                    latitude,
                    longitude,
                    altitude: 35.0,
                    accuracy: 5.0,
                    speed: config.speed_mps,
                    bearing: config.bearing_deg,
                };

                if tx.send(sample).await.is_err() {
                    break;
                }
                step += 1;
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            info!("Simulated sensor stopped");
            task.abort();
            let _ = task.await;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::clock::SystemClock;
    use std::time::Duration;

    fn config() -> SimulatedConfig {
        SimulatedConfig {
            interval: Duration::from_millis(1),
            max_samples: Some(5),
            ..SimulatedConfig::default()
        }
    }

    #[test]
    fn walk_starts_at_origin_and_moves_along_bearing() {
        let cfg = SimulatedConfig {
            bearing_deg: 0.0,
            ..config()
        };

        let (lat0, lon0) = SimulatedBackend::position_at(&cfg, 0);
        let (lat1, lon1) = SimulatedBackend::position_at(&cfg, 1000);

        assert_eq!((lat0, lon0), (cfg.origin_latitude, cfg.origin_longitude));
        assert!(lat1 > lat0, "heading north increases latitude");
        assert!((lon1 - lon0).abs() < 1e-9, "heading north keeps longitude");
    }

    #[tokio::test]
    async fn denied_permission_fails_start() {
        let cfg = SimulatedConfig {
            permission_granted: false,
            ..config()
        };
        let mut backend = SimulatedBackend::new(cfg, Arc::new(SystemClock::new()));

        let result = backend.start().await;

        assert!(matches!(result, Err(RecorderError::PermissionDenied)));
        assert!(!backend.is_capturing());
    }

    #[tokio::test]
    async fn emits_limited_samples_then_closes() {
        let mut backend = SimulatedBackend::new(config(), Arc::new(SystemClock::new()));
        let mut rx = backend.start().await.unwrap();

        let mut received = Vec::new();
        while let Some(sample) = rx.recv().await {
            received.push(sample);
        }

        assert_eq!(received.len(), 5);
        assert!(received
            .windows(2)
            .all(|w| w[0].monotonic_timestamp_ns <= w[1].monotonic_timestamp_ns));
        backend.stop().await.unwrap();
    }
}
