use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::location::{ReplayConfig, SimulatedConfig, SourceKind};
use crate::recording::RecorderConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recording: RecordingConfig,
    pub source: SourceConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordingConfig {
    pub output_dir: String,
    pub chunk_size: usize,
    pub drain_timeout_ms: u64,
    pub feed_capacity: usize,
    pub notify_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// "simulated" or "replay"
    pub kind: String,
    pub interval_ms: u64,
    pub permission_granted: bool,
    pub origin_latitude: f64,
    pub origin_longitude: f64,
    pub replay_path: Option<String>,
    pub replay_speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    pub enabled: bool,
}

impl Config {
    /// Load `path` (any format the config crate knows, extension optional)
    /// over built-in defaults, then apply `GPS_RECORDER__*` env overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "gps-recorder")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080)?
            .set_default("recording.output_dir", "~/Documents/GPS")?
            .set_default("recording.chunk_size", 10)?
            .set_default("recording.drain_timeout_ms", 2000)?
            .set_default("recording.feed_capacity", 256)?
            .set_default("recording.notify_timeout_ms", 2000)?
            .set_default("source.kind", "simulated")?
            .set_default("source.interval_ms", 1000)?
            .set_default("source.permission_granted", true)?
            .set_default("source.origin_latitude", 52.520008)?
            .set_default("source.origin_longitude", 13.404954)?
            .set_default("source.replay_speed", 1.0)?
            .set_default("events.enabled", true)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("GPS_RECORDER").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    /// Output directory with `~` and environment variables expanded
    pub fn output_dir(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.recording.output_dir)
            .with_context(|| format!("Cannot expand {}", self.recording.output_dir))?;
        Ok(PathBuf::from(expanded.into_owned()))
    }

    pub fn recorder_config(&self) -> Result<RecorderConfig> {
        Ok(RecorderConfig {
            output_dir: self.output_dir()?,
            chunk_size: self.recording.chunk_size,
            drain_timeout: Duration::from_millis(self.recording.drain_timeout_ms),
            notify_timeout: Duration::from_millis(self.recording.notify_timeout_ms),
            ..RecorderConfig::default()
        })
    }

    pub fn source_kind(&self) -> Result<SourceKind> {
        match self.source.kind.as_str() {
            "simulated" => Ok(SourceKind::Simulated(SimulatedConfig {
                interval: Duration::from_millis(self.source.interval_ms.max(1)),
                origin_latitude: self.source.origin_latitude,
                origin_longitude: self.source.origin_longitude,
                permission_granted: self.source.permission_granted,
                ..SimulatedConfig::default()
            })),
            "replay" => {
                let Some(path) = &self.source.replay_path else {
                    bail!("source.replay_path is required for the replay source");
                };
                let path = shellexpand::full(path)
                    .with_context(|| format!("Cannot expand {}", path))?;
                Ok(SourceKind::Replay(ReplayConfig {
                    path: PathBuf::from(path.into_owned()),
                    speed: self.source.replay_speed,
                }))
            }
            other => bail!("Unknown source kind: {}", other),
        }
    }
}
