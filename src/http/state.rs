use crate::recording::Recorder;
use crate::remote::ToggleCoordinator;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Read access for status queries and manual events
    pub recorder: Arc<Recorder>,

    /// Remote toggles go through here, never to the recorder directly
    pub coordinator: ToggleCoordinator,
}

impl AppState {
    pub fn new(recorder: Arc<Recorder>, coordinator: ToggleCoordinator) -> Self {
        Self {
            recorder,
            coordinator,
        }
    }
}
