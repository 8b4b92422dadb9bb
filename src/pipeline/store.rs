use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::location::ReconciledSample;

/// In-memory samples of the current session
///
/// Written only by the batch consumer; readers always get copies.
#[derive(Clone, Default)]
pub struct SessionStore {
    samples: Arc<RwLock<Vec<ReconciledSample>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ReconciledSample>> {
        self.samples
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ReconciledSample>> {
        self.samples
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, sample: ReconciledSample) {
        self.write().push(sample);
    }

    pub fn latest(&self) -> Option<ReconciledSample> {
        self.read().last().copied()
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    /// Snapshot of every sample recorded so far
    pub fn all(&self) -> Vec<ReconciledSample> {
        self.read().clone()
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}
