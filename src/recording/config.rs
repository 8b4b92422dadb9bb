use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the recording state machine
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Directory session logs are created in (resolved again at every open)
    pub output_dir: PathBuf,

    /// Samples per batch written to the session log
    /// Default: 10
    pub chunk_size: usize,

    /// How long stop waits for buffered batches to reach the log before
    /// cancelling the consumer
    pub drain_timeout: Duration,

    /// Upper bound for one event notification
    pub notify_timeout: Duration,

    /// Period of the elapsed-time ticker
    pub tick_interval: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("gps-recordings"),
            chunk_size: 10,
            drain_timeout: Duration::from_secs(2),
            notify_timeout: Duration::from_secs(2),
            tick_interval: Duration::from_secs(1), // 1 Hz
        }
    }
}
