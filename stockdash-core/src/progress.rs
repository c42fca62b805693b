//! Progress aggregation for bulk analysis runs.

use serde::Serialize;

use crate::job::StatusSnapshot;

/// Display form of one raw status snapshot.
///
/// Pure derivation: the percentage comes from `completed / total`, the ETA is
/// the backend's own estimate passed through unmodified — the client performs
/// no independent ETA computation. Counts that do not sum to `total` are
/// shown as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub percentage: u32,
    pub total: usize,
    pub completed: usize,
    pub successful: usize,
    pub analyzing: usize,
    pub failed: usize,
    pub pending: usize,
    pub error_count: usize,
    pub eta: Option<String>,
}

impl BatchProgress {
    pub fn from_snapshot(snap: &StatusSnapshot) -> Self {
        Self {
            percentage: percentage(snap.completed, snap.total),
            total: snap.total,
            completed: snap.completed,
            successful: snap.successful,
            analyzing: snap.analyzing,
            failed: snap.failed,
            pending: snap.pending,
            error_count: snap.errors.len(),
            eta: snap.eta.clone(),
        }
    }
}

/// `floor(100 * completed / total)`, 0 when `total` is 0.
pub fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed * 100) / total) as u32
}
