use thiserror::Error;

/// Errors surfaced by the recording core
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The positioning sensor refused to start (location permission missing)
    #[error("location permission denied")]
    PermissionDenied,

    /// Misconfiguration detected at construction time
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Write attempted on a session log that has already been closed
    #[error("session log is already closed")]
    SinkClosed,

    /// Opening or writing the session log failed
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Reverse geocoding was unavailable
    #[error("address lookup failed: {0}")]
    LookupFailure(String),
}

pub type Result<T> = std::result::Result<T, RecorderError>;
