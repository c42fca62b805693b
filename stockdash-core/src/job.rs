//! Job domain types and status snapshots.
//!
//! A `Job` is the client's record of one backend analysis run. It is created
//! at submit time and mutated only by applying freshly fetched
//! `StatusSnapshot`s — counts are never incremented locally.

use serde::{Deserialize, Serialize};

use crate::slot::Slot;

/// Opaque backend-assigned job identifier.
pub type JobId = String;

/// Backend-reported job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// One raw status payload as fetched from the backend.
///
/// Mirrors `GET /status/{job_id}`; the all-stocks progress payload is
/// normalized into this shape by the client. Counts are displayed as
/// received — backend-internal consistency (counts summing to `total`) is
/// never asserted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub completed: usize,
    #[serde(default)]
    pub successful: usize,
    #[serde(default)]
    pub analyzing: usize,
    #[serde(default)]
    pub failed: usize,
    #[serde(default)]
    pub pending: usize,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Backend-supplied remaining-time estimate, passed through unmodified.
    #[serde(default, rename = "estimated_time_remaining")]
    pub eta: Option<String>,
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Pending
    }
}

/// Client-side record of one backend analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub slot: Slot,
    pub status: JobStatus,
    /// 0–100; non-decreasing across applied snapshots while non-terminal.
    pub progress: u32,
    pub total: usize,
    pub completed: usize,
    pub successful: usize,
    pub analyzing: usize,
    pub failed: usize,
    pub pending: usize,
    pub errors: Vec<String>,
    pub eta: Option<String>,
}

impl Job {
    /// A freshly submitted job: pending, zero progress, empty counts.
    pub fn new(id: JobId, slot: Slot) -> Self {
        Self {
            id,
            slot,
            status: JobStatus::Pending,
            progress: 0,
            total: 0,
            completed: 0,
            successful: 0,
            analyzing: 0,
            failed: 0,
            pending: 0,
            errors: Vec::new(),
            eta: None,
        }
    }

    /// Apply a freshly fetched snapshot.
    ///
    /// No-op once the job has already reached a terminal status. Progress is
    /// clamped so it never decreases while the job is live; counts are taken
    /// as received.
    pub fn apply(&mut self, snap: &StatusSnapshot) {
        if self.status.is_terminal() {
            return;
        }
        self.status = snap.status;
        self.progress = self.progress.max(snap.progress.min(100));
        self.total = snap.total;
        self.completed = snap.completed;
        self.successful = snap.successful;
        self.analyzing = snap.analyzing;
        self.failed = snap.failed;
        self.pending = snap.pending;
        self.errors = snap.errors.clone();
        self.eta = snap.eta.clone();
    }
}
