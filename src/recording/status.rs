use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Recording phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Recording,
}

/// Authoritative recording state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingState {
    pub phase: Phase,
    pub sample_count: u32,
    pub session_log_path: Option<PathBuf>,
}

/// Everything a control surface shows about the recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingStatus {
    pub phase: Phase,

    /// Session currently recording
    pub session_id: Option<Uuid>,

    /// Samples received in the current session (refreshed every tick)
    pub sample_count: u32,

    /// Log file of the current session
    pub session_log_path: Option<PathBuf>,

    /// Elapsed recording time in whole seconds
    pub elapsed_secs: u64,

    /// Elapsed recording time as `HH:MM:SS`
    pub elapsed: String,

    /// Final sample count of the last finished session
    pub total_samples_collected: u32,

    pub status_message: String,

    /// Where the last session was saved, or "Save failed"
    pub saved_message: String,
}

impl Default for RecordingStatus {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            session_id: None,
            sample_count: 0,
            session_log_path: None,
            elapsed_secs: 0,
            elapsed: format_elapsed(0),
            total_samples_collected: 0,
            status_message: String::new(),
            saved_message: String::new(),
        }
    }
}

/// Format seconds as `HH:MM:SS`
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
