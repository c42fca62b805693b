//! Stockdash CLI — watchlist management, analysis jobs, and reports.
//!
//! Commands:
//! - `watchlist` — list, add, or remove watchlist symbols
//! - `analyze` — submit an analysis job and optionally watch it finish
//! - `all-stocks` — universe list, initialization, bulk analysis, progress
//! - `status` — one status snapshot for a job id
//! - `cancel` — request cancellation of a job id
//! - `report` — fetch or download a ticker's analysis report
//! - `history` — past analyses for a symbol, newest first

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use stockdash_client::config;
use stockdash_client::fs_store::FileStore;
use stockdash_client::http::HttpBackend;
use stockdash_client::service::{DashboardService, PollUpdate};
use stockdash_client::session::SessionMarkers;
use stockdash_client::types::WatchlistRow;
use stockdash_core::cache::CacheStore;
use stockdash_core::poller::PollOutcome;
use stockdash_core::progress::BatchProgress;
use stockdash_core::slot::Slot;

#[derive(Parser)]
#[command(name = "stockdash", about = "Stockdash CLI — stock analysis dashboard client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watchlist management commands.
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
    /// Submit an analysis job for the given tickers.
    Analyze {
        /// Tickers to analyze (e.g., TCS.NS INFY.NS).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Indicators to run (defaults to the backend's full set).
        #[arg(long, num_args = 1..)]
        indicators: Option<Vec<String>>,

        /// Poll until the job reaches a terminal state.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    /// Universe-wide analysis commands.
    AllStocks {
        #[command(subcommand)]
        action: AllStocksAction,
    },
    /// Print one status snapshot for a job id.
    Status {
        job_id: String,
    },
    /// Request cancellation of a job id (fire-and-forget).
    Cancel {
        job_id: String,
    },
    /// Fetch a ticker's analysis report.
    Report {
        ticker: String,

        /// Download the spreadsheet instead of printing JSON.
        #[arg(long, default_value_t = false)]
        download: bool,

        /// Output path for --download. Defaults to {ticker}_analysis.xlsx.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Past analyses for a symbol, newest first.
    History {
        symbol: String,
    },
}

#[derive(Subcommand)]
enum WatchlistAction {
    /// List watchlist symbols with their latest verdicts.
    List,
    /// Add a symbol to the watchlist.
    Add {
        symbol: String,
        /// Company name.
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Remove a symbol from the watchlist.
    Remove { symbol: String },
}

#[derive(Subcommand)]
enum AllStocksAction {
    /// List the stock universe (cached copy when still valid).
    List,
    /// Seed the universe list server-side.
    Init,
    /// Analyze the given symbols; no symbols means the full universe.
    Analyze {
        symbols: Vec<String>,

        /// Poll until the run finishes.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    /// Print the bulk run's progress.
    Progress {
        /// Keep polling until the run finishes.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
}

fn main() -> Result<()> {
    let _ = TermLogger::init(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let cli = Cli::parse();
    let mut service = build_service();

    match cli.command {
        Commands::Watchlist { action } => run_watchlist(&service, action),
        Commands::Analyze {
            tickers,
            indicators,
            watch,
        } => run_analyze(&mut service, tickers, indicators, watch),
        Commands::AllStocks { action } => run_all_stocks(&mut service, action),
        Commands::Status { job_id } => run_status(&service, &job_id),
        Commands::Cancel { job_id } => run_cancel(&service, &job_id),
        Commands::Report {
            ticker,
            download,
            out,
        } => run_report(&service, &ticker, download, out),
        Commands::History { symbol } => run_history(&service, &symbol),
    }
}

/// Same stores as the TUI, so a `--watch` run and the dashboard share
/// cached lists and session job markers.
fn build_service() -> DashboardService {
    let config_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockdash")
        .join("config.toml");
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockdash");
    let session_dir = dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("stockdash-session");

    let client_config = config::load(&config_path);
    let backend = Arc::new(HttpBackend::new(&client_config));
    let cache = CacheStore::new(
        Box::new(FileStore::new(data_dir.join("cache"))),
        Box::new(FileStore::new(session_dir.clone())),
    );
    let markers = SessionMarkers::new(Box::new(FileStore::new(session_dir)));
    DashboardService::new(backend, cache, markers)
}

fn run_watchlist(service: &DashboardService, action: WatchlistAction) -> Result<()> {
    match action {
        WatchlistAction::List => {
            let rows = service
                .refresh_watchlist()
                .context("failed to fetch watchlist")?;
            if rows.is_empty() {
                println!("Watchlist is empty.");
                return Ok(());
            }
            print_watchlist(&rows);
            Ok(())
        }
        WatchlistAction::Add { symbol, name } => {
            service
                .add_to_watchlist(&symbol, &name)
                .with_context(|| format!("failed to add {symbol}"))?;
            println!("Added {symbol} to watchlist");
            Ok(())
        }
        WatchlistAction::Remove { symbol } => {
            service
                .remove_from_watchlist(&symbol)
                .with_context(|| format!("failed to remove {symbol}"))?;
            println!("Removed {symbol} from watchlist");
            Ok(())
        }
    }
}

fn print_watchlist(rows: &[WatchlistRow]) {
    println!("{:<12} {:<30} {:<12} {:>6}", "SYMBOL", "NAME", "VERDICT", "SCORE");
    for row in rows {
        let verdict = row.verdict.as_deref().unwrap_or(if row.has_analysis {
            "-"
        } else {
            "not analyzed"
        });
        let score = row
            .score
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:<30} {:<12} {:>6}",
            row.symbol,
            row.name.as_deref().unwrap_or("-"),
            verdict,
            score
        );
    }
}

fn run_analyze(
    service: &mut DashboardService,
    tickers: Vec<String>,
    indicators: Option<Vec<String>>,
    watch: bool,
) -> Result<()> {
    let slot = if tickers.len() == 1 {
        Slot::SingleTicker
    } else {
        Slot::Watchlist
    };

    let handle = service
        .submit(slot, &tickers, indicators.as_deref())
        .context("failed to start analysis")?;
    println!("Analysis started: job {} ({} tickers)", handle.job_id, tickers.len());

    if watch {
        watch_slot(service, slot)?;
    } else {
        println!("Check progress with: stockdash status {}", handle.job_id);
    }
    Ok(())
}

fn run_all_stocks(service: &mut DashboardService, action: AllStocksAction) -> Result<()> {
    match action {
        AllStocksAction::List => {
            let (stocks, cached) = if service.all_stocks_is_valid() {
                match service.cached_all_stocks() {
                    Some(stocks) => (stocks, true),
                    None => (service.refresh_all_stocks()?, false),
                }
            } else {
                (service.refresh_all_stocks()?, false)
            };

            println!(
                "{:<12} {:<32} {:<10} {:>6} {:<12}{}",
                "SYMBOL",
                "NAME",
                "STATUS",
                "SCORE",
                "VERDICT",
                if cached { "  (cached)" } else { "" }
            );
            for stock in &stocks {
                println!(
                    "{:<12} {:<32} {:<10} {:>6} {:<12}",
                    stock.symbol,
                    stock.name,
                    format!("{:?}", stock.status).to_lowercase(),
                    stock
                        .score
                        .map(|s| format!("{s:.1}"))
                        .unwrap_or_else(|| "-".to_string()),
                    stock.verdict.as_deref().unwrap_or("-"),
                );
            }
            println!("{} stocks", stocks.len());
            Ok(())
        }
        AllStocksAction::Init => {
            let count = service
                .initialize_all_stocks()
                .context("failed to initialize the universe")?;
            println!("Initialized {count} stocks");
            Ok(())
        }
        AllStocksAction::Analyze { symbols, watch } => {
            let handle = service
                .submit(Slot::AllStocks, &symbols, None)
                .context("failed to start bulk analysis")?;
            if symbols.is_empty() {
                println!("Bulk analysis of the full universe started: job {}", handle.job_id);
            } else {
                println!(
                    "Bulk analysis of {} symbols started: job {}",
                    symbols.len(),
                    handle.job_id
                );
            }
            if watch {
                watch_slot(service, Slot::AllStocks)?;
            }
            Ok(())
        }
        AllStocksAction::Progress { watch } => {
            if !watch {
                let snap = service
                    .bulk_progress()
                    .context("failed to fetch progress")?;
                print_progress_line(&BatchProgress::from_snapshot(&snap));
                return Ok(());
            }

            // Re-attach to the session's bulk job when a marker exists;
            // otherwise follow the tracker directly until it goes quiet.
            service.recover();
            if service.is_busy(Slot::AllStocks) {
                return watch_slot(service, Slot::AllStocks);
            }
            loop {
                let snap = service
                    .bulk_progress()
                    .context("failed to fetch progress")?;
                print_progress_line(&BatchProgress::from_snapshot(&snap));
                if snap.status.is_terminal() {
                    return Ok(());
                }
                std::thread::sleep(Slot::AllStocks.poll_interval());
            }
        }
    }
}

fn watch_slot(service: &mut DashboardService, slot: Slot) -> Result<()> {
    loop {
        std::thread::sleep(slot.poll_interval());
        match service.poll_once(slot) {
            PollUpdate::Progress { progress, .. } => print_progress_line(&progress),
            PollUpdate::Finished { outcome, job, .. } => {
                return match outcome {
                    PollOutcome::Completed => {
                        println!(
                            "Analysis completed: {}/{} stocks analyzed successfully",
                            job.successful, job.total
                        );
                        Ok(())
                    }
                    PollOutcome::Failed => {
                        for error in &job.errors {
                            eprintln!("  error: {error}");
                        }
                        bail!("analysis failed")
                    }
                    PollOutcome::Cancelled => {
                        println!("Analysis was cancelled");
                        Ok(())
                    }
                    PollOutcome::Errored => bail!("status fetch failed; polling stopped"),
                };
            }
            PollUpdate::Idle => return Ok(()),
        }
    }
}

fn print_progress_line(progress: &BatchProgress) {
    let eta = progress
        .eta
        .as_deref()
        .map(|eta| format!("  ETA: {eta}"))
        .unwrap_or_default();
    println!(
        "  {}% — {}/{} analyzed, {} in flight, {} failed, {} pending{eta}",
        progress.percentage,
        progress.completed,
        progress.total,
        progress.analyzing,
        progress.failed,
        progress.pending
    );
}

fn run_status(service: &DashboardService, job_id: &str) -> Result<()> {
    let snapshot = service
        .job_status(job_id)
        .with_context(|| format!("failed to fetch status for job {job_id}"))?;
    let progress = BatchProgress::from_snapshot(&snapshot);
    println!("Job {job_id}: {:?}", snapshot.status);
    print_progress_line(&progress);
    for error in &snapshot.errors {
        eprintln!("  error: {error}");
    }
    Ok(())
}

fn run_cancel(service: &DashboardService, job_id: &str) -> Result<()> {
    service
        .request_cancel(job_id)
        .with_context(|| format!("failed to cancel job {job_id}"))?;
    println!("Cancellation requested for job {job_id}");
    Ok(())
}

fn run_report(
    service: &DashboardService,
    ticker: &str,
    download: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    if download {
        let bytes = service
            .report_download(ticker)
            .with_context(|| format!("failed to download report for {ticker}"))?;
        let path = out.unwrap_or_else(|| PathBuf::from(format!("{ticker}_analysis.xlsx")));
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Report written to {}", path.display());
    } else {
        let report = service
            .report(ticker)
            .with_context(|| format!("failed to fetch report for {ticker}"))?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn run_history(service: &DashboardService, symbol: &str) -> Result<()> {
    let history = service
        .stock_history(symbol)
        .with_context(|| format!("failed to fetch history for {symbol}"))?;
    if history.is_empty() {
        println!("No analysis history for {symbol}");
        return Ok(());
    }

    println!("{:<22} {:<12} {:>6} {:>9} {:>9}", "ANALYZED", "VERDICT", "SCORE", "ENTRY", "TARGET");
    for record in &history {
        println!(
            "{:<22} {:<12} {:>6} {:>9} {:>9}",
            record.analyzed_at.as_deref().unwrap_or("-"),
            record.verdict.as_deref().unwrap_or("-"),
            record
                .score
                .map(|s| format!("{s:.1}"))
                .unwrap_or_else(|| "-".to_string()),
            record
                .entry
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string()),
            record
                .target
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}
