pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod location;
pub mod pipeline;
pub mod recording;
pub mod remote;

pub use config::Config;
pub use error::{RecorderError, Result};
pub use events::{Event, EventNotifier, NoopNotifier, ReverseGeocoder, TracingNotifier};
pub use http::{create_router, AppState};
pub use location::{
    Clock, LocationBackend, LocationBackendFactory, LocationSource, RawSample, ReconciledSample,
    SourceKind, SourcePhase, SystemClock,
};
pub use pipeline::{chunked, SessionLogWriter, SessionStore, LOG_HEADER};
pub use recording::{
    Phase, Recorder, RecorderConfig, RecorderEvent, RecordingState, RecordingStatus, Session,
    SessionSummary, ToggleOutcome,
};
pub use remote::ToggleCoordinator;
