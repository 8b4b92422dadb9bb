// Replay backend
//
// Re-emits a recorded session log. Recorded timestamps only drive the pacing;
// every emitted sample is re-stamped with the current monotonic clock so it
// reconciles like a live reading.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{LocationBackend, ReplayConfig};
use super::clock::Clock;
use super::sample::RawSample;
use crate::error::{RecorderError, Result};

const CHANNEL_CAPACITY: usize = 256;

/// One row of a replay file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayRecord {
    pub timestamp_ns: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub accuracy: f32,
    pub speed: f32,
    pub bearing: f32,
}

/// Parse `timestamp_ns,latitude,longitude[,altitude,accuracy,speed,bearing]` rows
///
/// Header lines and malformed rows are skipped.
pub fn parse_replay(contents: &str) -> Vec<ReplayRecord> {
    let mut records = Vec::new();

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            warn!("Replay line {} has {} fields, skipping", line_no + 1, fields.len());
            continue;
        }

        let Ok(timestamp_ns) = fields[0].parse::<i64>() else {
            debug!("Replay line {} is not a sample, skipping", line_no + 1);
            continue;
        };

        let (Ok(latitude), Ok(longitude)) = (fields[1].parse::<f64>(), fields[2].parse::<f64>())
        else {
            warn!("Replay line {} has bad coordinates, skipping", line_no + 1);
            continue;
        };

        let optional_f64 = |i: usize| fields.get(i).and_then(|v| v.parse::<f64>().ok());
        let optional_f32 = |i: usize| fields.get(i).and_then(|v| v.parse::<f32>().ok());

        records.push(ReplayRecord {
            timestamp_ns,
            latitude,
            longitude,
            altitude: optional_f64(3).unwrap_or(0.0),
            accuracy: optional_f32(4).unwrap_or(0.0),
            speed: optional_f32(5).unwrap_or(0.0),
            bearing: optional_f32(6).unwrap_or(0.0),
        });
    }

    records
}

pub struct ReplayBackend {
    config: ReplayConfig,
    clock: Arc<dyn Clock>,
    task: Option<JoinHandle<()>>,
}

impl ReplayBackend {
    pub fn new(config: ReplayConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            task: None,
        }
    }

    fn pacing(previous: i64, current: i64, speed: f64) -> Duration {
        let delta_ns = current.saturating_sub(previous).max(0) as f64;
        Duration::from_nanos((delta_ns / speed) as u64)
    }
}

#[async_trait::async_trait]
impl LocationBackend for ReplayBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<RawSample>> {
        if self.task.is_some() {
            return Err(RecorderError::InvalidArgument(
                "replay already running".to_string(),
            ));
        }
        if self.config.speed.is_nan() || self.config.speed <= 0.0 {
            return Err(RecorderError::InvalidArgument(format!(
                "replay speed must be positive, got {}",
                self.config.speed
            )));
        }

        let contents = tokio::fs::read_to_string(&self.config.path).await?;
        let records = parse_replay(&contents);

        info!(
            "Replaying {} samples from {:?} at {}x",
            records.len(),
            self.config.path,
            self.config.speed
        );

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let clock = Arc::clone(&self.clock);
        let speed = self.config.speed;

        self.task = Some(tokio::spawn(async move {
            let mut previous: Option<i64> = None;

            for record in records {
                if let Some(prev) = previous {
                    tokio::time::sleep(Self::pacing(prev, record.timestamp_ns, speed)).await;
                }
                previous = Some(record.timestamp_ns);

                let sample = RawSample {
                    monotonic_timestamp_ns: clock.monotonic_now_ns(),
                    latitude: record.latitude,
                    longitude: record.longitude,
                    altitude: record.altitude,
                    accuracy: record.accuracy,
                    speed: record.speed,
                    bearing: record.bearing,
                };

                if tx.send(sample).await.is_err() {
                    return;
                }
            }

            info!("Replay finished");
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!("Replay stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn name(&self) -> &str {
        "replay"
    }
}
