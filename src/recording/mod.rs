//! Recording state machine
//!
//! This module provides the `Recorder` that owns:
//! - The Idle/Recording phase and its transitions
//! - Session identity (clock snapshot, log file name)
//! - The batch consumer and elapsed-time ticker of the running session
//! - Status and domain events for control surfaces

mod config;
mod recorder;
mod session;
mod status;

pub use config::RecorderConfig;
pub use recorder::{Recorder, RecorderEvent, SessionSummary, ToggleOutcome};
pub use session::Session;
pub use status::{format_elapsed, Phase, RecordingState, RecordingStatus};
