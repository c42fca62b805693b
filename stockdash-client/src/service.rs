//! Job submission and poll orchestration.
//!
//! `DashboardService` is the composition root both front ends drive. It owns
//! the backend handle, the two-tier cache, the session markers, and one poll
//! engine per slot. Callers own the wall-clock: `poll_once` performs exactly
//! one fetch-apply-act tick, so tests (and the CLI's `--watch` loop, and the
//! TUI worker's scheduler) decide when ticks happen.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use stockdash_core::cache::CacheStore;
use stockdash_core::job::{Job, JobId, JobStatus, StatusSnapshot};
use stockdash_core::poller::{PollEngine, PollOutcome, PollStep};
use stockdash_core::progress::BatchProgress;
use stockdash_core::selection::SelectionManager;
use stockdash_core::slot::Slot;
use stockdash_core::store::StoreError;

use crate::backend::{ApiError, Backend};
use crate::session::SessionMarkers;
use crate::types::{AnalysisRecord, StockEntry, WatchlistRow};

/// Why a submission was rejected.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("slot '{slot}' already has a running job")]
    SlotBusy { slot: Slot },

    #[error("no stocks selected")]
    EmptySelection,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What a successful submission hands back to the UI.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub slot: Slot,
    pub job_id: JobId,
}

/// Outcome of one `poll_once` tick.
#[derive(Debug)]
pub enum PollUpdate {
    /// Nothing happened: slot idle, or a superseded response was discarded.
    Idle,
    /// Job still live; re-arm the timer at `slot.poll_interval()`.
    Progress {
        slot: Slot,
        status: JobStatus,
        progress: BatchProgress,
    },
    /// The run ended. Fires exactly once per run; the slot is free again.
    Finished {
        slot: Slot,
        outcome: PollOutcome,
        job: Job,
    },
}

/// One poll engine per slot, statically keyed.
struct SlotEngines {
    single: PollEngine,
    watchlist: PollEngine,
    all_stocks: PollEngine,
}

impl SlotEngines {
    fn new() -> Self {
        Self {
            single: PollEngine::new(Slot::SingleTicker),
            watchlist: PollEngine::new(Slot::Watchlist),
            all_stocks: PollEngine::new(Slot::AllStocks),
        }
    }

    fn get(&self, slot: Slot) -> &PollEngine {
        match slot {
            Slot::SingleTicker => &self.single,
            Slot::Watchlist => &self.watchlist,
            Slot::AllStocks => &self.all_stocks,
        }
    }

    fn get_mut(&mut self, slot: Slot) -> &mut PollEngine {
        match slot {
            Slot::SingleTicker => &mut self.single,
            Slot::Watchlist => &mut self.watchlist,
            Slot::AllStocks => &mut self.all_stocks,
        }
    }
}

pub struct DashboardService {
    backend: Arc<dyn Backend>,
    cache: CacheStore,
    markers: SessionMarkers,
    engines: SlotEngines,
}

impl DashboardService {
    pub fn new(backend: Arc<dyn Backend>, cache: CacheStore, markers: SessionMarkers) -> Self {
        Self {
            backend,
            cache,
            markers,
            engines: SlotEngines::new(),
        }
    }

    /// Whether the slot currently hosts a non-terminal job.
    pub fn is_busy(&self, slot: Slot) -> bool {
        self.engines.get(slot).is_active()
    }

    /// The live job record for a slot, if any.
    pub fn active_job(&self, slot: Slot) -> Option<&Job> {
        let engine = self.engines.get(slot);
        engine.is_active().then(|| engine.job()).flatten()
    }

    // ── Submission ───────────────────────────────────────────────────

    /// Submit an analysis job into `slot`.
    ///
    /// Exactly one backend job-creation call per invocation, no retries.
    /// The slot's list cache is invalidated before the request goes out.
    pub fn submit(
        &mut self,
        slot: Slot,
        tickers: &[String],
        indicators: Option<&[String]>,
    ) -> Result<JobHandle, SubmitError> {
        if self.engines.get(slot).is_active() {
            return Err(SubmitError::SlotBusy { slot });
        }
        if tickers.is_empty() && !slot.allows_empty_selection() {
            return Err(SubmitError::EmptySelection);
        }

        // Invalidate first so no concurrent reader observes a
        // valid-but-soon-wrong snapshot.
        self.cache.invalidate(slot.cache_key())?;

        let created = match slot {
            Slot::AllStocks => self.backend.analyze_all_stocks(tickers)?,
            Slot::SingleTicker | Slot::Watchlist => self.backend.analyze(tickers, indicators)?,
        };

        self.engines.get_mut(slot).start(created.job_id.clone());
        if let Err(e) = self.markers.set_active_job(slot, &created.job_id) {
            log::warn!("failed to record job marker for slot {slot}: {e}");
        }

        log::info!("submitted job {} into slot {slot}", created.job_id);
        Ok(JobHandle {
            slot,
            job_id: created.job_id,
        })
    }

    /// Submit the current selection and clear it on success.
    pub fn submit_selection(
        &mut self,
        slot: Slot,
        selection: &mut SelectionManager,
        indicators: Option<&[String]>,
    ) -> Result<JobHandle, SubmitError> {
        let tickers = selection.to_sorted_vec();
        let handle = self.submit(slot, &tickers, indicators)?;
        selection.clear();
        Ok(handle)
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// One poll tick for `slot`: fetch status, apply it, act on the
    /// transition. The next tick is the caller's to schedule — never before
    /// this one has resolved, so in-flight polls never overlap per job.
    pub fn poll_once(&mut self, slot: Slot) -> PollUpdate {
        let Some(ticket) = self.engines.get(slot).ticket() else {
            return PollUpdate::Idle;
        };

        let fetched = match slot {
            Slot::AllStocks => self
                .backend
                .all_stocks_progress()
                .map(|progress| progress.to_snapshot()),
            Slot::SingleTicker | Slot::Watchlist => {
                let Some(job_id) = self.engines.get(slot).job().map(|j| j.id.clone()) else {
                    return PollUpdate::Idle;
                };
                self.backend.job_status(&job_id)
            }
        };

        match fetched {
            Ok(snap) => match self.engines.get_mut(slot).on_snapshot(ticket, &snap) {
                PollStep::Stale => PollUpdate::Idle,
                PollStep::Continue => PollUpdate::Progress {
                    slot,
                    status: snap.status,
                    progress: BatchProgress::from_snapshot(&snap),
                },
                PollStep::Finished(outcome) => self.finish(slot, outcome),
            },
            Err(e) => match self.engines.get_mut(slot).on_fetch_error(ticket) {
                PollStep::Finished(outcome) => {
                    log::warn!("status fetch for slot {slot} failed: {e}");
                    self.finish(slot, outcome)
                }
                _ => PollUpdate::Idle,
            },
        }
    }

    /// Cancel the slot's active job.
    ///
    /// The backend request is fire-and-forget: local polling stops and the
    /// job flips to cancelled regardless of the acknowledgement. Returns the
    /// cancelled job record, or `None` when nothing was running.
    pub fn cancel(&mut self, slot: Slot) -> Option<Job> {
        let job_id = self.active_job(slot)?.id.clone();

        if let Err(e) = self.backend.cancel_job(&job_id) {
            log::warn!("cancel request for job {job_id} failed: {e}");
        }

        self.engines.get_mut(slot).cancel();
        self.markers.clear(slot);
        self.engines.get_mut(slot).take_job()
    }

    /// Re-attach poll engines to jobs recorded earlier in this session.
    ///
    /// A marker whose status probe fails is cleared and recovery silently
    /// gives up for that slot — degrade to "no active job", never loop.
    pub fn recover(&mut self) -> Vec<JobHandle> {
        let mut recovered = Vec::new();
        for slot in Slot::ALL {
            let Some(job_id) = self.markers.active_job(slot) else {
                continue;
            };
            if self.engines.get(slot).is_active() {
                continue;
            }

            let probe = match slot {
                Slot::AllStocks => self.backend.all_stocks_progress().map(|_| ()),
                Slot::SingleTicker | Slot::Watchlist => {
                    self.backend.job_status(&job_id).map(|_| ())
                }
            };

            match probe {
                Ok(()) => {
                    self.engines.get_mut(slot).start(job_id.clone());
                    log::info!("re-attached to job {job_id} in slot {slot}");
                    recovered.push(JobHandle { slot, job_id });
                }
                Err(e) => {
                    log::debug!("session recovery for slot {slot} gave up: {e}");
                    self.markers.clear(slot);
                }
            }
        }
        recovered
    }

    fn finish(&mut self, slot: Slot, outcome: PollOutcome) -> PollUpdate {
        self.markers.clear(slot);
        // A job-terminal outcome rewrites the slot's result list; refetch it.
        // After a transport error the backend is likely unreachable anyway.
        if outcome != PollOutcome::Errored {
            self.repopulate(slot);
        }
        match self.engines.get_mut(slot).take_job() {
            Some(job) => PollUpdate::Finished { slot, outcome, job },
            None => PollUpdate::Idle,
        }
    }

    fn repopulate(&self, slot: Slot) {
        let refreshed = match slot {
            Slot::AllStocks => self.refresh_all_stocks().map(|_| ()),
            Slot::SingleTicker | Slot::Watchlist => self.refresh_watchlist().map(|_| ()),
        };
        if let Err(e) = refreshed {
            log::warn!(
                "failed to repopulate '{}' after job end: {e}",
                slot.cache_key()
            );
        }
    }

    // ── Lists (stale-while-revalidate) ───────────────────────────────

    /// Cached watchlist rows, stale or not. Render these immediately; when
    /// `watchlist_is_valid` is false, follow up with `refresh_watchlist`.
    pub fn cached_watchlist(&self) -> Option<Vec<WatchlistRow>> {
        self.cache.read("watchlist")
    }

    pub fn watchlist_is_valid(&self) -> bool {
        self.cache.is_valid("watchlist")
    }

    /// Fetch the authoritative watchlist, enrich each symbol with its latest
    /// analysis, then cache and re-validate the rows.
    pub fn refresh_watchlist(&self) -> Result<Vec<WatchlistRow>, ApiError> {
        let entries = self.backend.watchlist()?;
        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            // Per-symbol history is best-effort: a symbol without analysis
            // history is still a valid row.
            let latest = match self.backend.stock_history(&entry.symbol) {
                Ok(history) => history.into_iter().next(),
                Err(e) => {
                    log::debug!("no analysis history for {}: {e}", entry.symbol);
                    None
                }
            };
            rows.push(match latest {
                Some(record) => WatchlistRow {
                    symbol: entry.symbol,
                    name: entry.name,
                    verdict: record.verdict,
                    score: record.score,
                    has_analysis: true,
                },
                None => WatchlistRow {
                    symbol: entry.symbol,
                    name: entry.name,
                    verdict: None,
                    score: None,
                    has_analysis: false,
                },
            });
        }
        self.store_list("watchlist", &rows);
        Ok(rows)
    }

    pub fn cached_all_stocks(&self) -> Option<Vec<StockEntry>> {
        self.cache.read("all_stocks")
    }

    pub fn all_stocks_is_valid(&self) -> bool {
        self.cache.is_valid("all_stocks")
    }

    /// Fetch the authoritative universe list, then cache and re-validate it.
    pub fn refresh_all_stocks(&self) -> Result<Vec<StockEntry>, ApiError> {
        let stocks = self.backend.all_stocks()?;
        self.store_list("all_stocks", &stocks);
        Ok(stocks)
    }

    fn store_list<T: Serialize>(&self, key: &str, rows: &T) {
        match self.cache.write(key, rows) {
            Ok(()) => {
                if let Err(e) = self.cache.mark_valid(key) {
                    log::warn!("failed to re-validate cache '{key}': {e}");
                }
            }
            Err(e) => log::warn!("failed to cache '{key}': {e}"),
        }
    }

    // ── Pass-through operations ──────────────────────────────────────

    /// One status snapshot for an explicit job id, outside any tracked slot.
    pub fn job_status(&self, job_id: &str) -> Result<StatusSnapshot, ApiError> {
        self.backend.job_status(job_id)
    }

    /// One-shot view of the bulk tracker, normalized to the common snapshot
    /// shape. Independent of whether a bulk job is tracked locally.
    pub fn bulk_progress(&self) -> Result<StatusSnapshot, ApiError> {
        Ok(self.backend.all_stocks_progress()?.to_snapshot())
    }

    /// Request cancellation of an explicit job id. Any session marker still
    /// pointing at it is dropped so recovery will not re-attach.
    pub fn request_cancel(&self, job_id: &str) -> Result<(), ApiError> {
        self.backend.cancel_job(job_id)?;
        for slot in Slot::ALL {
            if self.markers.active_job(slot).as_deref() == Some(job_id) {
                self.markers.clear(slot);
            }
        }
        Ok(())
    }

    /// Seed the universe list server-side. The cached list is known-stale
    /// afterwards, so its validity is dropped up front.
    pub fn initialize_all_stocks(&self) -> Result<usize, ApiError> {
        if let Err(e) = self.cache.invalidate("all_stocks") {
            log::warn!("failed to invalidate all-stocks cache: {e}");
        }
        Ok(self.backend.initialize_all_stocks()?.count)
    }

    pub fn stock_history(&self, symbol: &str) -> Result<Vec<AnalysisRecord>, ApiError> {
        self.backend.stock_history(symbol)
    }

    pub fn report(&self, ticker: &str) -> Result<serde_json::Value, ApiError> {
        self.backend.report(ticker)
    }

    pub fn report_download(&self, ticker: &str) -> Result<Vec<u8>, ApiError> {
        self.backend.report_download(ticker)
    }

    pub fn add_to_watchlist(&self, symbol: &str, name: &str) -> Result<(), ApiError> {
        if let Err(e) = self.cache.invalidate("watchlist") {
            log::warn!("failed to invalidate watchlist cache: {e}");
        }
        self.backend.watchlist_add(symbol, name)
    }

    pub fn remove_from_watchlist(&self, symbol: &str) -> Result<(), ApiError> {
        if let Err(e) = self.cache.invalidate("watchlist") {
            log::warn!("failed to invalidate watchlist cache: {e}");
        }
        self.backend.watchlist_remove(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use stockdash_core::job::StatusSnapshot;
    use stockdash_core::store::MemoryStore;
    use stockdash_core::KvStore;

    use crate::types::{
        AllStocksProgress, InitializedUniverse, JobCreated, StockStatus, WatchlistEntry,
    };

    /// Scripted backend: records every call, pops canned status responses.
    #[derive(Default)]
    struct MockBackend {
        calls: Mutex<Vec<String>>,
        statuses: Mutex<VecDeque<Result<StatusSnapshot, ApiError>>>,
        bulk: Mutex<VecDeque<Result<AllStocksProgress, ApiError>>>,
        submit_fails: Mutex<bool>,
        history: Mutex<HashMap<String, Vec<AnalysisRecord>>>,
    }

    impl MockBackend {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls_named(&self, name: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.as_str() == name)
                .count()
        }

        fn push_status(&self, status: Result<StatusSnapshot, ApiError>) {
            self.statuses.lock().unwrap().push_back(status);
        }

        fn push_bulk(&self, progress: Result<AllStocksProgress, ApiError>) {
            self.bulk.lock().unwrap().push_back(progress);
        }
    }

    fn running(progress: u32) -> StatusSnapshot {
        StatusSnapshot {
            status: JobStatus::Running,
            progress,
            total: 1,
            ..StatusSnapshot::default()
        }
    }

    fn completed() -> StatusSnapshot {
        StatusSnapshot {
            status: JobStatus::Completed,
            progress: 100,
            total: 1,
            completed: 1,
            successful: 1,
            ..StatusSnapshot::default()
        }
    }

    impl Backend for MockBackend {
        fn analyze(
            &self,
            _tickers: &[String],
            _indicators: Option<&[String]>,
        ) -> Result<JobCreated, ApiError> {
            self.record("analyze");
            if *self.submit_fails.lock().unwrap() {
                return Err(ApiError::NetworkUnreachable("connection refused".into()));
            }
            Ok(JobCreated {
                job_id: "job-1".into(),
            })
        }

        fn job_status(&self, _job_id: &str) -> Result<StatusSnapshot, ApiError> {
            self.record("job_status");
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(running(0)))
        }

        fn cancel_job(&self, _job_id: &str) -> Result<(), ApiError> {
            self.record("cancel_job");
            Ok(())
        }

        fn all_stocks_progress(&self) -> Result<AllStocksProgress, ApiError> {
            self.record("all_stocks_progress");
            self.bulk.lock().unwrap().pop_front().unwrap_or_else(|| {
                Ok(AllStocksProgress {
                    is_analyzing: true,
                    total: 500,
                    ..AllStocksProgress::default()
                })
            })
        }

        fn initialize_all_stocks(&self) -> Result<InitializedUniverse, ApiError> {
            self.record("initialize_all_stocks");
            Ok(InitializedUniverse { count: 500 })
        }

        fn all_stocks(&self) -> Result<Vec<StockEntry>, ApiError> {
            self.record("all_stocks");
            Ok(vec![StockEntry {
                yahoo_symbol: "TCS.NS".into(),
                symbol: "TCS".into(),
                name: "Tata Consultancy Services".into(),
                status: StockStatus::Completed,
                score: Some(72.5),
                verdict: Some("Buy".into()),
                entry: Some(3510.0),
                target: Some(3800.0),
                has_analysis: true,
            }])
        }

        fn analyze_all_stocks(&self, _symbols: &[String]) -> Result<JobCreated, ApiError> {
            self.record("analyze_all_stocks");
            Ok(JobCreated {
                job_id: "bulk-1".into(),
            })
        }

        fn stock_history(&self, symbol: &str) -> Result<Vec<AnalysisRecord>, ApiError> {
            self.record("stock_history");
            Ok(self
                .history
                .lock()
                .unwrap()
                .get(symbol)
                .cloned()
                .unwrap_or_default())
        }

        fn report(&self, _ticker: &str) -> Result<serde_json::Value, ApiError> {
            self.record("report");
            Ok(serde_json::json!({"verdict": "Buy"}))
        }

        fn report_download(&self, _ticker: &str) -> Result<Vec<u8>, ApiError> {
            self.record("report_download");
            Ok(vec![0x50, 0x4b])
        }

        fn watchlist(&self) -> Result<Vec<WatchlistEntry>, ApiError> {
            self.record("watchlist");
            Ok(vec![WatchlistEntry {
                symbol: "TCS.NS".into(),
                name: Some("Tata Consultancy Services".into()),
            }])
        }

        fn watchlist_add(&self, _symbol: &str, _name: &str) -> Result<(), ApiError> {
            self.record("watchlist_add");
            Ok(())
        }

        fn watchlist_remove(&self, _symbol: &str) -> Result<(), ApiError> {
            self.record("watchlist_remove");
            Ok(())
        }
    }

    fn service_with(backend: Arc<MockBackend>) -> DashboardService {
        let cache = CacheStore::new(Box::new(MemoryStore::new()), Box::new(MemoryStore::new()));
        let markers = SessionMarkers::new(Box::new(MemoryStore::new()));
        DashboardService::new(backend, cache, markers)
    }

    #[test]
    fn busy_slot_rejects_without_a_second_backend_call() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        service
            .submit(Slot::Watchlist, &["TCS.NS".into()], None)
            .unwrap();
        let err = service
            .submit(Slot::Watchlist, &["INFY.NS".into()], None)
            .unwrap_err();

        assert!(matches!(err, SubmitError::SlotBusy { slot: Slot::Watchlist }));
        assert_eq!(backend.calls_named("analyze"), 1);
        // The original job is still the one being polled.
        assert_eq!(service.active_job(Slot::Watchlist).unwrap().id, "job-1");
    }

    #[test]
    fn empty_selection_sends_no_request() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        let err = service.submit(Slot::Watchlist, &[], None).unwrap_err();
        assert!(matches!(err, SubmitError::EmptySelection));
        assert_eq!(backend.calls_named("analyze"), 0);
    }

    #[test]
    fn single_run_invalidates_at_submit_and_repopulates_on_completion() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        // A valid cached watchlist exists before the run.
        service.refresh_watchlist().unwrap();
        assert!(service.watchlist_is_valid());

        service
            .submit(Slot::SingleTicker, &["TCS.NS".into()], None)
            .unwrap();
        assert!(!service.watchlist_is_valid());
        // Stale-while-revalidate: the snapshot is still renderable.
        assert!(service.cached_watchlist().is_some());

        backend.push_status(Ok(running(40)));
        match service.poll_once(Slot::SingleTicker) {
            PollUpdate::Progress { status, progress, .. } => {
                assert_eq!(status, JobStatus::Running);
                assert_eq!(progress.percentage, 0);
            }
            other => panic!("expected progress, got {other:?}"),
        }

        backend.push_status(Ok(completed()));
        match service.poll_once(Slot::SingleTicker) {
            PollUpdate::Finished { outcome, job, .. } => {
                assert_eq!(outcome, PollOutcome::Completed);
                assert_eq!(job.successful, 1);
            }
            other => panic!("expected finished, got {other:?}"),
        }

        // Terminal: cache repopulated and valid again, marker gone, slot free.
        assert!(service.watchlist_is_valid());
        assert!(!service.is_busy(Slot::SingleTicker));
        // One poll after completion is a no-op, not a second completion.
        assert!(matches!(
            service.poll_once(Slot::SingleTicker),
            PollUpdate::Idle
        ));
    }

    #[test]
    fn poll_transport_error_is_errored_and_frees_the_slot() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        service
            .submit(Slot::Watchlist, &["TCS.NS".into()], None)
            .unwrap();
        backend.push_status(Err(ApiError::NetworkUnreachable("timed out".into())));

        match service.poll_once(Slot::Watchlist) {
            PollUpdate::Finished { outcome, .. } => {
                assert_eq!(outcome, PollOutcome::Errored);
            }
            other => panic!("expected errored finish, got {other:?}"),
        }

        // Distinct from a job-reported failure: no list refetch happened,
        // and the slot accepts a new submission.
        assert!(!service.watchlist_is_valid());
        assert!(!service.is_busy(Slot::Watchlist));
        assert_eq!(backend.calls_named("watchlist"), 0);
        service
            .submit(Slot::Watchlist, &["TCS.NS".into()], None)
            .unwrap();
    }

    #[test]
    fn job_reported_failure_still_repopulates() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        service
            .submit(Slot::Watchlist, &["TCS.NS".into()], None)
            .unwrap();
        backend.push_status(Ok(StatusSnapshot {
            status: JobStatus::Failed,
            errors: vec!["TCS.NS: no data".into()],
            ..StatusSnapshot::default()
        }));

        match service.poll_once(Slot::Watchlist) {
            PollUpdate::Finished { outcome, job, .. } => {
                assert_eq!(outcome, PollOutcome::Failed);
                assert_eq!(job.errors.len(), 1);
            }
            other => panic!("expected failed finish, got {other:?}"),
        }
        assert_eq!(backend.calls_named("watchlist"), 1);
    }

    #[test]
    fn cancel_stops_polling_and_clears_the_marker() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        service
            .submit(Slot::Watchlist, &["TCS.NS".into()], None)
            .unwrap();
        let job = service.cancel(Slot::Watchlist).unwrap();

        assert_eq!(job.status, JobStatus::Cancelled);
        assert_eq!(backend.calls_named("cancel_job"), 1);
        assert!(!service.is_busy(Slot::Watchlist));
        // No further ticks happen for the cancelled run.
        assert!(matches!(
            service.poll_once(Slot::Watchlist),
            PollUpdate::Idle
        ));
        assert_eq!(backend.calls_named("job_status"), 0);
        // Nothing left to recover.
        assert!(service.recover().is_empty());
    }

    #[test]
    fn cancel_with_nothing_running_is_none() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());
        assert!(service.cancel(Slot::SingleTicker).is_none());
        assert_eq!(backend.calls_named("cancel_job"), 0);
    }

    #[test]
    fn all_stocks_accepts_empty_selection_and_polls_the_bulk_tracker() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        // Empty symbol list means "analyze everything".
        let handle = service.submit(Slot::AllStocks, &[], None).unwrap();
        assert_eq!(handle.job_id, "bulk-1");
        assert_eq!(backend.calls_named("analyze_all_stocks"), 1);

        backend.push_bulk(Ok(AllStocksProgress {
            is_analyzing: true,
            total: 500,
            completed: 0,
            ..AllStocksProgress::default()
        }));
        match service.poll_once(Slot::AllStocks) {
            PollUpdate::Progress { progress, .. } => {
                assert_eq!(progress.percentage, 0);
                assert_eq!(progress.total, 500);
            }
            other => panic!("expected progress, got {other:?}"),
        }
        // The bulk slot polls its own tracker, never /status.
        assert_eq!(backend.calls_named("all_stocks_progress"), 1);
        assert_eq!(backend.calls_named("job_status"), 0);
    }

    #[test]
    fn bulk_completion_refreshes_the_universe_list() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        service.submit(Slot::AllStocks, &[], None).unwrap();
        backend.push_bulk(Ok(AllStocksProgress {
            is_analyzing: false,
            analyzing: 0,
            total: 500,
            completed: 500,
            percentage: 100,
            ..AllStocksProgress::default()
        }));

        match service.poll_once(Slot::AllStocks) {
            PollUpdate::Finished { outcome, .. } => {
                assert_eq!(outcome, PollOutcome::Completed);
            }
            other => panic!("expected finished, got {other:?}"),
        }
        assert_eq!(backend.calls_named("all_stocks"), 1);
        assert!(service.all_stocks_is_valid());
        assert_eq!(service.cached_all_stocks().unwrap().len(), 1);
    }

    #[test]
    fn recovery_reattaches_to_a_live_job() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        service
            .submit(Slot::Watchlist, &["TCS.NS".into()], None)
            .unwrap();

        // Simulate a reload: new service over the same marker store.
        let markers_store = MemoryStore::new();
        markers_store
            .put(&Slot::Watchlist.marker_key(), "job-1")
            .unwrap();
        let cache = CacheStore::new(Box::new(MemoryStore::new()), Box::new(MemoryStore::new()));
        let mut reloaded = DashboardService::new(
            backend.clone(),
            cache,
            SessionMarkers::new(Box::new(markers_store)),
        );

        backend.push_status(Ok(running(10)));
        let recovered = reloaded.recover();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].job_id, "job-1");
        assert!(reloaded.is_busy(Slot::Watchlist));
        // Re-attach probes the backend but never resubmits.
        assert_eq!(backend.calls_named("analyze"), 1);
    }

    #[test]
    fn recovery_gives_up_silently_on_a_dead_marker() {
        let backend = Arc::new(MockBackend::default());

        let markers_store = MemoryStore::new();
        markers_store
            .put(&Slot::SingleTicker.marker_key(), "job-gone")
            .unwrap();
        let cache = CacheStore::new(Box::new(MemoryStore::new()), Box::new(MemoryStore::new()));
        let mut service = DashboardService::new(
            backend.clone(),
            cache,
            SessionMarkers::new(Box::new(markers_store)),
        );

        backend.push_status(Err(ApiError::JobNotFound {
            job_id: "job-gone".into(),
        }));
        let recovered = service.recover();

        assert!(recovered.is_empty());
        assert!(!service.is_busy(Slot::SingleTicker));
        // The dead marker is gone; a second recovery does not probe again.
        backend.calls.lock().unwrap().clear();
        assert!(service.recover().is_empty());
        assert_eq!(backend.calls_named("job_status"), 0);
    }

    #[test]
    fn submit_selection_clears_only_on_success() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        let mut selection = SelectionManager::new();
        selection.toggle("TCS.NS");
        selection.toggle("INFY.NS");

        *backend.submit_fails.lock().unwrap() = true;
        let err = service
            .submit_selection(Slot::Watchlist, &mut selection, None)
            .unwrap_err();
        assert!(matches!(err, SubmitError::Api(_)));
        assert_eq!(selection.len(), 2);
        assert!(!service.is_busy(Slot::Watchlist));

        *backend.submit_fails.lock().unwrap() = false;
        service
            .submit_selection(Slot::Watchlist, &mut selection, None)
            .unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn watchlist_rows_carry_latest_analysis() {
        let backend = Arc::new(MockBackend::default());
        backend.history.lock().unwrap().insert(
            "TCS.NS".into(),
            vec![
                AnalysisRecord {
                    verdict: Some("Strong Buy".into()),
                    score: Some(81.0),
                    entry: Some(3510.0),
                    target: Some(3900.0),
                    analyzed_at: Some("2025-07-30T10:00:00".into()),
                },
                AnalysisRecord {
                    verdict: Some("Buy".into()),
                    score: Some(65.0),
                    entry: None,
                    target: None,
                    analyzed_at: Some("2025-07-01T10:00:00".into()),
                },
            ],
        );
        let service = service_with(backend.clone());

        let rows = service.refresh_watchlist().unwrap();
        assert_eq!(rows.len(), 1);
        // Newest-first: the first history record wins.
        assert_eq!(rows[0].verdict.as_deref(), Some("Strong Buy"));
        assert!(rows[0].has_analysis);
    }

    #[test]
    fn explicit_cancel_by_id_drops_the_matching_marker() {
        let backend = Arc::new(MockBackend::default());
        let mut service = service_with(backend.clone());

        service
            .submit(Slot::Watchlist, &["TCS.NS".into()], None)
            .unwrap();
        service.request_cancel("job-1").unwrap();

        assert_eq!(backend.calls_named("cancel_job"), 1);
        // Recovery has nothing to re-attach to.
        backend.calls.lock().unwrap().clear();
        assert!(service.recover().is_empty());
        assert_eq!(backend.calls_named("job_status"), 0);
    }
}
