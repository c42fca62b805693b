//! Application state — single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};

use chrono::NaiveDateTime;

use stockdash_client::types::{StockEntry, WatchlistRow};
use stockdash_core::job::JobStatus;
use stockdash_core::progress::BatchProgress;
use stockdash_core::selection::SelectionManager;
use stockdash_core::slot::Slot;

use crate::worker::{WorkerCommand, WorkerResponse};

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Watchlist,
    AllStocks,
}

impl Panel {
    pub fn label(self) -> &'static str {
        match self {
            Panel::Watchlist => "Watchlist",
            Panel::AllStocks => "All Stocks",
        }
    }

    pub fn next(self) -> Panel {
        match self {
            Panel::Watchlist => Panel::AllStocks,
            Panel::AllStocks => Panel::Watchlist,
        }
    }

    /// The slot this panel submits into.
    pub fn slot(self) -> Slot {
        match self {
            Panel::Watchlist => Slot::Watchlist,
            Panel::AllStocks => Slot::AllStocks,
        }
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub context: String,
    pub message: String,
}

/// Live progress display for one slot.
#[derive(Debug, Clone)]
pub struct SlotProgress {
    pub status: JobStatus,
    pub progress: BatchProgress,
}

/// Watchlist panel state.
#[derive(Debug, Default)]
pub struct WatchlistPanelState {
    pub rows: Vec<WatchlistRow>,
    pub cursor: usize,
    pub stale: bool,
    pub loading: bool,
}

/// All-stocks panel state.
#[derive(Debug, Default)]
pub struct AllStocksPanelState {
    pub stocks: Vec<StockEntry>,
    pub cursor: usize,
    pub stale: bool,
    pub loading: bool,
    pub search: String,
    pub searching: bool,
}

pub struct AppState {
    pub running: bool,
    pub active_panel: Panel,
    pub show_errors: bool,
    pub watchlist: WatchlistPanelState,
    pub all_stocks: AllStocksPanelState,
    /// Selected symbols per panel; ephemeral, never persisted.
    pub watch_selection: SelectionManager,
    pub stock_selection: SelectionManager,
    /// Live progress per slot, present only while a job is tracked.
    pub progress: HashMap<Slot, SlotProgress>,
    pub status_message: Option<(String, StatusLevel)>,
    pub errors: Vec<ErrorRecord>,
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,
}

impl AppState {
    pub fn new(worker_tx: Sender<WorkerCommand>, worker_rx: Receiver<WorkerResponse>) -> Self {
        Self {
            running: true,
            active_panel: Panel::Watchlist,
            show_errors: false,
            watchlist: WatchlistPanelState::default(),
            all_stocks: AllStocksPanelState::default(),
            watch_selection: SelectionManager::new(),
            stock_selection: SelectionManager::new(),
            progress: HashMap::new(),
            status_message: None,
            errors: Vec::new(),
            worker_tx,
            worker_rx,
        }
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Error));
    }

    pub fn push_error(&mut self, context: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        self.set_error(message.clone());
        self.errors.push(ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            context: context.into(),
            message,
        });
    }

    pub fn send(&mut self, cmd: WorkerCommand) {
        if self.worker_tx.send(cmd).is_err() {
            self.set_error("worker thread is gone");
        }
    }

    /// Stocks visible under the current search filter, in list order.
    pub fn visible_stocks(&self) -> Vec<&StockEntry> {
        let query = self.all_stocks.search.trim().to_lowercase();
        self.all_stocks
            .stocks
            .iter()
            .filter(|s| {
                query.is_empty()
                    || s.symbol.to_lowercase().contains(&query)
                    || s.name.to_lowercase().contains(&query)
                    || s.yahoo_symbol.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Ids of the visible stocks — the set select-all operates on.
    pub fn visible_symbols(&self) -> Vec<String> {
        self.visible_stocks()
            .iter()
            .map(|s| s.yahoo_symbol.clone())
            .collect()
    }
}
