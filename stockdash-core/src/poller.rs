//! Poll state machine for one job slot.
//!
//! `Idle -> Polling -> {Completed, Failed, Cancelled, Errored}`.
//!
//! The engine owns no timer and performs no I/O: a driver fetches the status
//! at the slot's cadence and feeds the result back in, so tests drive ticks
//! deterministically. Each fetch is tagged with a `PollTicket`; a response
//! whose ticket belongs to a superseded generation (the job was cancelled or
//! the engine restarted meanwhile) is discarded without touching state.
//!
//! `Errored` means the status fetch itself failed and is deliberately a
//! different terminal state from `Failed`, which means the job ran and the
//! backend reported it failed.

use crate::job::{Job, JobId, JobStatus, StatusSnapshot};
use crate::slot::Slot;

/// Engine phase. Everything except `Polling` accepts a new `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Polling,
    Completed,
    Failed,
    Cancelled,
    Errored,
}

impl PollPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PollPhase::Completed | PollPhase::Failed | PollPhase::Cancelled | PollPhase::Errored
        )
    }
}

/// Ties an in-flight status fetch to the generation that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    generation: u64,
}

/// How the slot's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    Cancelled,
    /// The status fetch itself failed; the job's real fate is unknown.
    Errored,
}

/// What the driver should do after feeding a fetch result in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// The response belonged to a superseded generation; nothing changed.
    Stale,
    /// Still pending/running: re-arm the timer at the slot cadence.
    Continue,
    /// Terminal. Fires exactly once per run; the driver repopulates the
    /// slot's list cache and clears the session marker.
    Finished(PollOutcome),
}

/// Per-slot poll state machine.
#[derive(Debug)]
pub struct PollEngine {
    slot: Slot,
    phase: PollPhase,
    job: Option<Job>,
    generation: u64,
}

impl PollEngine {
    pub fn new(slot: Slot) -> Self {
        Self {
            slot,
            phase: PollPhase::Idle,
            job: None,
            generation: 0,
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// The job record for the current or most recent run.
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// Whether the slot is occupied by a non-terminal job.
    pub fn is_active(&self) -> bool {
        self.phase == PollPhase::Polling
    }

    /// Begin polling `job_id`.
    ///
    /// Starting while already polling is a no-op that returns the existing
    /// ticket — no second timer, no replacement job record.
    pub fn start(&mut self, job_id: JobId) -> PollTicket {
        if self.phase == PollPhase::Polling {
            return PollTicket {
                generation: self.generation,
            };
        }
        self.generation += 1;
        self.phase = PollPhase::Polling;
        self.job = Some(Job::new(job_id, self.slot));
        PollTicket {
            generation: self.generation,
        }
    }

    /// Ticket for issuing the next fetch; `None` when not polling.
    pub fn ticket(&self) -> Option<PollTicket> {
        (self.phase == PollPhase::Polling).then_some(PollTicket {
            generation: self.generation,
        })
    }

    /// Apply a successfully fetched status snapshot.
    pub fn on_snapshot(&mut self, ticket: PollTicket, snap: &StatusSnapshot) -> PollStep {
        if !self.accepts(ticket) {
            return PollStep::Stale;
        }
        if let Some(job) = self.job.as_mut() {
            job.apply(snap);
        }
        match snap.status {
            JobStatus::Pending | JobStatus::Running => PollStep::Continue,
            JobStatus::Completed => self.finish(PollPhase::Completed, PollOutcome::Completed),
            JobStatus::Failed => self.finish(PollPhase::Failed, PollOutcome::Failed),
            JobStatus::Cancelled => self.finish(PollPhase::Cancelled, PollOutcome::Cancelled),
        }
    }

    /// The status fetch itself failed (transport error, not a job failure).
    pub fn on_fetch_error(&mut self, ticket: PollTicket) -> PollStep {
        if !self.accepts(ticket) {
            return PollStep::Stale;
        }
        self.finish(PollPhase::Errored, PollOutcome::Errored)
    }

    /// Local half of cancellation; call once the backend cancel request has
    /// resolved. Stops polling immediately — a still-in-flight response for
    /// the old generation will be discarded as stale. Returns false when the
    /// slot was not polling.
    pub fn cancel(&mut self) -> bool {
        if self.phase != PollPhase::Polling {
            return false;
        }
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Cancelled;
        }
        self.generation += 1;
        self.phase = PollPhase::Cancelled;
        true
    }

    /// Discard the finished job record and return to `Idle`.
    pub fn take_job(&mut self) -> Option<Job> {
        if self.phase == PollPhase::Polling {
            return None;
        }
        self.phase = PollPhase::Idle;
        self.job.take()
    }

    fn accepts(&self, ticket: PollTicket) -> bool {
        self.phase == PollPhase::Polling && ticket.generation == self.generation
    }

    fn finish(&mut self, phase: PollPhase, outcome: PollOutcome) -> PollStep {
        self.generation += 1;
        self.phase = phase;
        PollStep::Finished(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: JobStatus, progress: u32) -> StatusSnapshot {
        StatusSnapshot {
            status,
            progress,
            total: 1,
            completed: usize::from(status == JobStatus::Completed),
            successful: usize::from(status == JobStatus::Completed),
            ..StatusSnapshot::default()
        }
    }

    #[test]
    fn single_ticker_run_completes_exactly_once() {
        let mut engine = PollEngine::new(Slot::SingleTicker);
        let ticket = engine.start("job-1".into());

        let step = engine.on_snapshot(ticket, &snapshot(JobStatus::Running, 40));
        assert_eq!(step, PollStep::Continue);
        assert_eq!(engine.job().unwrap().progress, 40);

        let step = engine.on_snapshot(ticket, &snapshot(JobStatus::Completed, 100));
        assert_eq!(step, PollStep::Finished(PollOutcome::Completed));
        assert_eq!(engine.phase(), PollPhase::Completed);

        // A duplicate terminal response must not fire completion again.
        let step = engine.on_snapshot(ticket, &snapshot(JobStatus::Completed, 100));
        assert_eq!(step, PollStep::Stale);
    }

    #[test]
    fn fetch_error_is_errored_not_failed() {
        let mut engine = PollEngine::new(Slot::Watchlist);
        let ticket = engine.start("job-2".into());

        let step = engine.on_fetch_error(ticket);
        assert_eq!(step, PollStep::Finished(PollOutcome::Errored));
        assert_eq!(engine.phase(), PollPhase::Errored);
        assert_ne!(engine.phase(), PollPhase::Failed);
    }

    #[test]
    fn job_reported_failure_is_failed() {
        let mut engine = PollEngine::new(Slot::Watchlist);
        let ticket = engine.start("job-3".into());

        let step = engine.on_snapshot(ticket, &snapshot(JobStatus::Failed, 60));
        assert_eq!(step, PollStep::Finished(PollOutcome::Failed));
        assert_eq!(engine.phase(), PollPhase::Failed);
    }

    #[test]
    fn start_while_polling_is_a_noop_returning_existing_ticket() {
        let mut engine = PollEngine::new(Slot::AllStocks);
        let first = engine.start("job-4".into());
        let second = engine.start("job-5".into());

        assert_eq!(first, second);
        // The original job record survives.
        assert_eq!(engine.job().unwrap().id, "job-4");
    }

    #[test]
    fn cancel_stops_polling_and_stale_response_is_discarded() {
        let mut engine = PollEngine::new(Slot::Watchlist);
        let ticket = engine.start("job-6".into());
        engine.on_snapshot(ticket, &snapshot(JobStatus::Running, 30));

        assert!(engine.cancel());
        assert_eq!(engine.phase(), PollPhase::Cancelled);
        assert_eq!(engine.job().unwrap().status, JobStatus::Cancelled);

        // The in-flight response from before the cancel arrives late.
        let step = engine.on_snapshot(ticket, &snapshot(JobStatus::Running, 90));
        assert_eq!(step, PollStep::Stale);
        assert_eq!(engine.phase(), PollPhase::Cancelled);
        assert_eq!(engine.job().unwrap().progress, 30);
    }

    #[test]
    fn cancel_when_idle_reports_false() {
        let mut engine = PollEngine::new(Slot::SingleTicker);
        assert!(!engine.cancel());
    }

    #[test]
    fn slot_is_reusable_after_terminal_phase() {
        let mut engine = PollEngine::new(Slot::SingleTicker);
        let ticket = engine.start("job-7".into());
        engine.on_snapshot(ticket, &snapshot(JobStatus::Completed, 100));

        let done = engine.take_job().unwrap();
        assert_eq!(done.id, "job-7");
        assert_eq!(engine.phase(), PollPhase::Idle);

        let ticket = engine.start("job-8".into());
        assert!(engine.is_active());
        assert_eq!(
            engine.on_snapshot(ticket, &snapshot(JobStatus::Running, 5)),
            PollStep::Continue
        );
    }

    #[test]
    fn take_job_refuses_while_polling() {
        let mut engine = PollEngine::new(Slot::AllStocks);
        engine.start("job-9".into());
        assert!(engine.take_job().is_none());
        assert!(engine.is_active());
    }

    #[test]
    fn ticket_is_none_when_not_polling() {
        let mut engine = PollEngine::new(Slot::Watchlist);
        assert!(engine.ticket().is_none());
        engine.start("job-10".into());
        assert!(engine.ticket().is_some());
        engine.cancel();
        assert!(engine.ticket().is_none());
    }
}
