//! Background worker thread — all backend I/O runs here.
//!
//! Communication with the TUI main thread is via `mpsc` channels. The worker
//! owns the `DashboardService` and schedules poll ticks per slot at each
//! slot's own cadence; a new tick is only due after the previous fetch for
//! that slot has resolved.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use stockdash_client::service::{DashboardService, JobHandle, PollUpdate};
use stockdash_client::types::{StockEntry, WatchlistRow};
use stockdash_core::job::{Job, JobStatus};
use stockdash_core::poller::PollOutcome;
use stockdash_core::progress::BatchProgress;
use stockdash_core::slot::Slot;

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    RefreshWatchlist,
    RefreshAllStocks,
    InitializeAllStocks,
    Submit {
        slot: Slot,
        tickers: Vec<String>,
    },
    Cancel {
        slot: Slot,
    },
    Recover,
    RemoveStock {
        symbol: String,
    },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug)]
pub enum WorkerResponse {
    WatchlistLoaded {
        rows: Vec<WatchlistRow>,
        stale: bool,
    },
    AllStocksLoaded {
        stocks: Vec<StockEntry>,
        stale: bool,
    },
    UniverseInitialized {
        count: usize,
    },
    Submitted(JobHandle),
    SubmitRejected {
        slot: Slot,
        reason: String,
    },
    JobProgress {
        slot: Slot,
        status: JobStatus,
        progress: BatchProgress,
    },
    JobFinished {
        slot: Slot,
        outcome: PollOutcome,
        job: Job,
    },
    Cancelled {
        slot: Slot,
    },
    Recovered {
        handles: Vec<JobHandle>,
    },
    Error {
        context: String,
        message: String,
    },
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    service: DashboardService,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("stockdash-worker".into())
        .spawn(move || {
            worker_loop(service, rx, tx);
        })
        .expect("failed to spawn worker thread")
}

fn worker_loop(
    mut service: DashboardService,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) {
    let mut next_poll: HashMap<Slot, Instant> = HashMap::new();

    loop {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(WorkerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(cmd) => handle_command(cmd, &mut service, &tx, &mut next_poll),
            Err(RecvTimeoutError::Timeout) => {}
        }

        run_due_polls(&mut service, &tx, &mut next_poll);
    }
}

fn handle_command(
    cmd: WorkerCommand,
    service: &mut DashboardService,
    tx: &Sender<WorkerResponse>,
    next_poll: &mut HashMap<Slot, Instant>,
) {
    match cmd {
        WorkerCommand::RefreshWatchlist => {
            // Stale-while-revalidate: surface the cached rows right away,
            // then fetch fresh regardless so analysis columns stay current.
            if let Some(rows) = service.cached_watchlist() {
                let _ = tx.send(WorkerResponse::WatchlistLoaded {
                    rows,
                    stale: !service.watchlist_is_valid(),
                });
            }
            match service.refresh_watchlist() {
                Ok(rows) => {
                    let _ = tx.send(WorkerResponse::WatchlistLoaded { rows, stale: false });
                }
                Err(e) => {
                    let _ = tx.send(WorkerResponse::Error {
                        context: "watchlist refresh".into(),
                        message: e.to_string(),
                    });
                }
            }
        }
        WorkerCommand::RefreshAllStocks => {
            if let Some(stocks) = service.cached_all_stocks() {
                let _ = tx.send(WorkerResponse::AllStocksLoaded {
                    stocks,
                    stale: !service.all_stocks_is_valid(),
                });
            }
            match service.refresh_all_stocks() {
                Ok(stocks) => {
                    let _ = tx.send(WorkerResponse::AllStocksLoaded {
                        stocks,
                        stale: false,
                    });
                }
                Err(e) => {
                    let _ = tx.send(WorkerResponse::Error {
                        context: "all-stocks refresh".into(),
                        message: e.to_string(),
                    });
                }
            }
        }
        WorkerCommand::InitializeAllStocks => match service.initialize_all_stocks() {
            Ok(count) => {
                let _ = tx.send(WorkerResponse::UniverseInitialized { count });
                match service.refresh_all_stocks() {
                    Ok(stocks) => {
                        let _ = tx.send(WorkerResponse::AllStocksLoaded {
                            stocks,
                            stale: false,
                        });
                    }
                    Err(e) => {
                        let _ = tx.send(WorkerResponse::Error {
                            context: "all-stocks refresh".into(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(WorkerResponse::Error {
                    context: "initialize all stocks".into(),
                    message: e.to_string(),
                });
            }
        },
        WorkerCommand::Submit { slot, tickers } => match service.submit(slot, &tickers, None) {
            Ok(handle) => {
                next_poll.insert(slot, Instant::now() + slot.poll_interval());
                let _ = tx.send(WorkerResponse::Submitted(handle));
            }
            Err(e) => {
                let _ = tx.send(WorkerResponse::SubmitRejected {
                    slot,
                    reason: e.to_string(),
                });
            }
        },
        WorkerCommand::Cancel { slot } => {
            if service.cancel(slot).is_some() {
                next_poll.remove(&slot);
                let _ = tx.send(WorkerResponse::Cancelled { slot });
            }
        }
        WorkerCommand::Recover => {
            let handles = service.recover();
            for handle in &handles {
                next_poll.insert(handle.slot, Instant::now() + handle.slot.poll_interval());
            }
            let _ = tx.send(WorkerResponse::Recovered { handles });
        }
        WorkerCommand::RemoveStock { symbol } => {
            match service.remove_from_watchlist(&symbol) {
                Ok(()) => match service.refresh_watchlist() {
                    Ok(rows) => {
                        let _ = tx.send(WorkerResponse::WatchlistLoaded { rows, stale: false });
                    }
                    Err(e) => {
                        let _ = tx.send(WorkerResponse::Error {
                            context: "watchlist refresh".into(),
                            message: e.to_string(),
                        });
                    }
                },
                Err(e) => {
                    let _ = tx.send(WorkerResponse::Error {
                        context: format!("remove {symbol}"),
                        message: e.to_string(),
                    });
                }
            }
        }
        WorkerCommand::Shutdown => {} // handled in loop
    }
}

fn run_due_polls(
    service: &mut DashboardService,
    tx: &Sender<WorkerResponse>,
    next_poll: &mut HashMap<Slot, Instant>,
) {
    let now = Instant::now();
    for slot in Slot::ALL {
        if !service.is_busy(slot) {
            next_poll.remove(&slot);
            continue;
        }
        if next_poll.get(&slot).is_some_and(|due| *due > now) {
            continue;
        }

        match service.poll_once(slot) {
            PollUpdate::Progress {
                slot,
                status,
                progress,
            } => {
                // Re-arm only after the fetch resolved, so polls for one
                // slot never overlap.
                next_poll.insert(slot, Instant::now() + slot.poll_interval());
                let _ = tx.send(WorkerResponse::JobProgress {
                    slot,
                    status,
                    progress,
                });
            }
            PollUpdate::Finished { slot, outcome, job } => {
                next_poll.remove(&slot);
                let _ = tx.send(WorkerResponse::JobFinished { slot, outcome, job });
                // The service refreshed the slot's list on a job-terminal
                // outcome; push the updated rows to the UI.
                if outcome != PollOutcome::Errored {
                    match slot {
                        Slot::AllStocks => {
                            if let Some(stocks) = service.cached_all_stocks() {
                                let _ = tx.send(WorkerResponse::AllStocksLoaded {
                                    stocks,
                                    stale: !service.all_stocks_is_valid(),
                                });
                            }
                        }
                        Slot::SingleTicker | Slot::Watchlist => {
                            if let Some(rows) = service.cached_watchlist() {
                                let _ = tx.send(WorkerResponse::WatchlistLoaded {
                                    rows,
                                    stale: !service.watchlist_is_valid(),
                                });
                            }
                        }
                    }
                }
            }
            PollUpdate::Idle => {
                next_poll.remove(&slot);
            }
        }
    }
}
