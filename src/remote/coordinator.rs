// Toggle coordinator
//
// Single-slot handoff between whoever owns the recording state machine and
// out-of-band triggers (the HTTP remote control). Neither side holds a
// reference to the other; both hold a clone of the coordinator.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Handler invoked on every trigger
pub type ToggleCallback = Arc<dyn Fn() + Send + Sync>;

/// Shared handle to the toggle slot
///
/// At most one callback is registered; the last registration wins.
#[derive(Clone, Default)]
pub struct ToggleCoordinator {
    slot: Arc<Mutex<Option<ToggleCallback>>>,
}

impl ToggleCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ToggleCallback>> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Install `callback`, replacing any previous one
    ///
    /// Returns true if a callback was replaced.
    pub fn register<F>(&self, callback: F) -> bool
    where
        F: Fn() + Send + Sync + 'static,
    {
        let previous = self.lock().replace(Arc::new(callback));
        if previous.is_some() {
            warn!("Toggle callback replaced an existing registration");
        } else {
            debug!("Toggle callback registered");
        }
        previous.is_some()
    }

    /// Clear the slot; returns true if a callback was registered
    pub fn unregister(&self) -> bool {
        let previous = self.lock().take();
        debug!("Toggle callback unregistered");
        previous.is_some()
    }

    pub fn is_registered(&self) -> bool {
        self.lock().is_some()
    }

    /// Invoke the registered callback on the caller's thread
    ///
    /// With nothing registered this only logs a warning. Returns true if a
    /// callback ran.
    pub fn trigger(&self) -> bool {
        // Clone out of the slot so the callback may re-register or unregister.
        let callback = self.lock().clone();

        match callback {
            Some(callback) => {
                debug!("Toggle triggered");
                callback();
                true
            }
            None => {
                warn!("Toggle triggered but no callback is registered");
                false
            }
        }
    }
}
