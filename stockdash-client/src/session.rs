//! Session-scoped markers: which job id is live in each slot.
//!
//! The marker is what lets a reloaded app re-attach to a job it started
//! earlier in the same session. It is written on successful submission and
//! cleared on terminal status or explicit cancel.

use stockdash_core::job::JobId;
use stockdash_core::slot::Slot;
use stockdash_core::store::{KvStore, StoreError};

pub struct SessionMarkers {
    store: Box<dyn KvStore>,
}

impl SessionMarkers {
    pub fn new(store: Box<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn active_job(&self, slot: Slot) -> Option<JobId> {
        self.store.get(&slot.marker_key()).filter(|id| !id.is_empty())
    }

    pub fn set_active_job(&self, slot: Slot, job_id: &str) -> Result<(), StoreError> {
        self.store.put(&slot.marker_key(), job_id)
    }

    /// Best-effort: a marker that cannot be cleared only costs one extra
    /// recovery probe next reload.
    pub fn clear(&self, slot: Slot) {
        if let Err(e) = self.store.remove(&slot.marker_key()) {
            log::warn!("failed to clear job marker for slot {slot}: {e}");
        }
    }
}
