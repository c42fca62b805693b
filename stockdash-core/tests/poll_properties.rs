//! Property tests for orchestration invariants.
//!
//! Uses proptest to verify:
//! 1. Progress monotonicity — applied snapshots never lower a live job's progress
//! 2. Toggle involution — toggling an id twice restores prior membership
//! 3. Percentage bounds — aggregation never divides by zero or exceeds 100
//! 4. Terminal exactly-once — a run emits at most one Finished step

use proptest::prelude::*;

use stockdash_core::job::{Job, JobStatus, StatusSnapshot};
use stockdash_core::poller::{PollEngine, PollStep};
use stockdash_core::progress::percentage;
use stockdash_core::selection::SelectionManager;
use stockdash_core::slot::Slot;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_live_status() -> impl Strategy<Value = JobStatus> {
    prop_oneof![Just(JobStatus::Pending), Just(JobStatus::Running)]
}

fn arb_status() -> impl Strategy<Value = JobStatus> {
    prop_oneof![
        Just(JobStatus::Pending),
        Just(JobStatus::Running),
        Just(JobStatus::Completed),
        Just(JobStatus::Failed),
        Just(JobStatus::Cancelled),
    ]
}

fn arb_snapshot() -> impl Strategy<Value = StatusSnapshot> {
    (arb_status(), 0u32..150, 0usize..600, 0usize..600).prop_map(
        |(status, progress, total, completed)| StatusSnapshot {
            status,
            progress,
            total,
            completed,
            ..StatusSnapshot::default()
        },
    )
}

fn arb_live_snapshot() -> impl Strategy<Value = StatusSnapshot> {
    (arb_live_status(), 0u32..150, 0usize..600, 0usize..600).prop_map(
        |(status, progress, total, completed)| StatusSnapshot {
            status,
            progress,
            total,
            completed,
            ..StatusSnapshot::default()
        },
    )
}

// ── 1. Progress monotonicity ─────────────────────────────────────────

proptest! {
    /// Whatever order snapshots arrive in, a live job's displayed progress
    /// never decreases, and never leaves 0..=100.
    #[test]
    fn progress_non_decreasing(snaps in prop::collection::vec(arb_live_snapshot(), 1..40)) {
        let mut job = Job::new("j".into(), Slot::Watchlist);
        let mut previous = job.progress;
        for snap in &snaps {
            job.apply(snap);
            prop_assert!(job.progress >= previous);
            prop_assert!(job.progress <= 100);
            previous = job.progress;
        }
    }
}

// ── 2. Toggle involution ─────────────────────────────────────────────

proptest! {
    /// `toggle(id); toggle(id)` restores prior membership for every id.
    #[test]
    fn toggle_twice_restores_membership(
        seed in prop::collection::hash_set("[A-Z]{2,5}\\.NS", 0..12),
        id in "[A-Z]{2,5}\\.NS",
    ) {
        let mut sel = SelectionManager::new();
        sel.select_all(seed.iter().cloned());
        let before = sel.contains(&id);

        sel.toggle(&id);
        sel.toggle(&id);

        prop_assert_eq!(sel.contains(&id), before);
        prop_assert_eq!(sel.len(), seed.len());
    }
}

// ── 3. Percentage bounds ─────────────────────────────────────────────

proptest! {
    #[test]
    fn percentage_never_panics_and_stays_bounded(
        completed in 0usize..1000,
        total in 0usize..1000,
    ) {
        let pct = percentage(completed, total);
        if total == 0 {
            prop_assert_eq!(pct, 0);
        } else if completed <= total {
            prop_assert!(pct <= 100);
        }
    }
}

// ── 4. Terminal exactly-once ─────────────────────────────────────────

proptest! {
    /// However many snapshots a run sees, at most one of them yields a
    /// Finished step, and every step after it is Stale.
    #[test]
    fn at_most_one_finished_step(snaps in prop::collection::vec(arb_snapshot(), 1..40)) {
        let mut engine = PollEngine::new(Slot::AllStocks);
        let ticket = engine.start("job".into());

        let mut finished = 0;
        for snap in &snaps {
            match engine.on_snapshot(ticket, snap) {
                PollStep::Finished(_) => finished += 1,
                PollStep::Stale => prop_assert!(finished > 0),
                PollStep::Continue => prop_assert_eq!(finished, 0),
            }
        }
        prop_assert!(finished <= 1);
    }
}
