//! Stockdash TUI — watchlist and all-stocks panels with live job progress.
//!
//! The main thread owns the terminal and `AppState`; a worker thread owns
//! the `DashboardService` and all backend I/O. On startup the app recovers
//! any job left over from an earlier load in this session and renders cached
//! lists immediately while fresh copies are fetched.

mod app;
mod input;
mod logging;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use stockdash_client::config;
use stockdash_client::fs_store::FileStore;
use stockdash_client::service::DashboardService;
use stockdash_client::session::SessionMarkers;
use stockdash_client::http::HttpBackend;
use stockdash_core::cache::CacheStore;
use stockdash_core::job::{JobStatus, StatusSnapshot};
use stockdash_core::poller::PollOutcome;
use stockdash_core::progress::BatchProgress;

use crate::app::{AppState, SlotProgress};
use crate::worker::{WorkerCommand, WorkerResponse};

fn main() -> Result<()> {
    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // Paths
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockdash");
    let config_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockdash")
        .join("config.toml");
    // The session tier maps browser sessionStorage semantics onto the OS
    // runtime dir, which is cleared at login-session end.
    let session_dir = dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("stockdash-session");

    logging::initialize(&data_dir.join("stockdash.log"));

    // Build the service: HTTP backend + two-tier cache + session markers.
    let client_config = config::load(&config_path);
    let backend = Arc::new(HttpBackend::new(&client_config));
    let cache = CacheStore::new(
        Box::new(FileStore::new(data_dir.join("cache"))),
        Box::new(FileStore::new(session_dir.clone())),
    );
    let markers = SessionMarkers::new(Box::new(FileStore::new(session_dir)));
    let service = DashboardService::new(backend, cache, markers);

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle = worker::spawn_worker(service, cmd_rx, resp_tx);

    let mut app = AppState::new(cmd_tx.clone(), resp_rx);
    app.watchlist.loading = true;
    app.all_stocks.loading = true;

    // Startup: re-attach to any session job, then load both lists
    // (cached rows arrive first, fresh rows follow).
    app.send(WorkerCommand::Recover);
    app.send(WorkerCommand::RefreshWatchlist);
    app.send(WorkerCommand::RefreshAllStocks);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    // Shutdown worker
    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = app.worker_rx.try_recv() {
            handle_worker_response(app, resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}

fn handle_worker_response(app: &mut AppState, resp: WorkerResponse) {
    match resp {
        WorkerResponse::WatchlistLoaded { rows, stale } => {
            app.watchlist.loading = false;
            app.watchlist.stale = stale;
            app.watchlist.cursor = app.watchlist.cursor.min(rows.len().saturating_sub(1));
            app.watchlist.rows = rows;
        }
        WorkerResponse::AllStocksLoaded { stocks, stale } => {
            app.all_stocks.loading = false;
            app.all_stocks.stale = stale;
            app.all_stocks.cursor = app.all_stocks.cursor.min(stocks.len().saturating_sub(1));
            app.all_stocks.stocks = stocks;
        }
        WorkerResponse::UniverseInitialized { count } => {
            app.set_status(format!("universe initialized: {count} stocks"));
        }
        WorkerResponse::Submitted(handle) => {
            app.set_status(format!(
                "analysis started in slot {} (job {})",
                handle.slot, handle.job_id
            ));
            // Selection is cleared once the submission has succeeded.
            match handle.slot {
                stockdash_core::slot::Slot::AllStocks => app.stock_selection.clear(),
                _ => app.watch_selection.clear(),
            }
            app.progress.insert(
                handle.slot,
                SlotProgress {
                    status: JobStatus::Pending,
                    progress: BatchProgress::from_snapshot(&StatusSnapshot::default()),
                },
            );
        }
        WorkerResponse::SubmitRejected { slot, reason } => {
            app.set_warning(format!("cannot analyze ({slot}): {reason}"));
        }
        WorkerResponse::JobProgress {
            slot,
            status,
            progress,
        } => {
            app.progress.insert(slot, SlotProgress { status, progress });
        }
        WorkerResponse::JobFinished { slot, outcome, job } => {
            app.progress.remove(&slot);
            match outcome {
                PollOutcome::Completed => app.set_status(format!(
                    "analysis completed: {}/{} stocks analyzed successfully",
                    job.successful, job.total
                )),
                PollOutcome::Failed => {
                    let detail = job
                        .errors
                        .first()
                        .cloned()
                        .unwrap_or_else(|| "no detail reported".to_string());
                    app.push_error(format!("job {}", job.id), format!("analysis failed: {detail}"));
                }
                PollOutcome::Cancelled => app.set_status("analysis was cancelled"),
                PollOutcome::Errored => app.push_error(
                    format!("slot {slot}"),
                    "status fetch failed; polling stopped",
                ),
            }
        }
        WorkerResponse::Cancelled { slot } => {
            app.progress.remove(&slot);
            app.set_status(format!("analysis cancelled ({slot})"));
        }
        WorkerResponse::Recovered { handles } => {
            for handle in handles {
                app.set_status(format!(
                    "re-attached to running job {} ({})",
                    handle.job_id, handle.slot
                ));
                app.progress.insert(
                    handle.slot,
                    SlotProgress {
                        status: JobStatus::Running,
                        progress: BatchProgress::from_snapshot(&StatusSnapshot::default()),
                    },
                );
            }
        }
        WorkerResponse::Error { context, message } => {
            app.push_error(context, message);
        }
    }
}
