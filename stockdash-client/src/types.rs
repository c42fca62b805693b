//! Wire types for the analysis backend's REST contract.
//!
//! These structs mirror the JSON the backend actually sends; optional and
//! defaulted fields keep decoding tolerant of older backend builds.

use serde::{Deserialize, Serialize};

use stockdash_core::job::{JobStatus, StatusSnapshot};

/// Response to `POST /analyze` and `POST /analyze-all-stocks`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobCreated {
    pub job_id: String,
}

/// Request body for `POST /analyze`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub tickers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<Vec<String>>,
}

/// Request body for `POST /analyze-all-stocks`. An empty `symbols` list
/// means "analyze everything".
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeAllRequest {
    pub symbols: Vec<String>,
}

/// `GET /all-stocks/progress` payload — the bulk run's status tracker.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllStocksProgress {
    #[serde(default)]
    pub is_analyzing: bool,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub completed: usize,
    #[serde(default)]
    pub analyzing: usize,
    #[serde(default)]
    pub failed: usize,
    #[serde(default)]
    pub pending: usize,
    #[serde(default)]
    pub percentage: u32,
    #[serde(default)]
    pub estimated_time_remaining: Option<String>,
}

impl AllStocksProgress {
    /// Normalize into the common snapshot shape.
    ///
    /// The bulk tracker has no explicit terminal status: it counts as
    /// running while the backend says it is analyzing (or still reports
    /// symbols in flight), completed otherwise.
    pub fn to_snapshot(&self) -> StatusSnapshot {
        let status = if self.is_analyzing || self.analyzing > 0 {
            JobStatus::Running
        } else {
            JobStatus::Completed
        };
        StatusSnapshot {
            status,
            progress: self.percentage.min(100),
            total: self.total,
            completed: self.completed,
            successful: 0,
            analyzing: self.analyzing,
            failed: self.failed,
            pending: self.pending,
            errors: Vec::new(),
            eta: self.estimated_time_remaining.clone(),
        }
    }
}

/// Per-symbol analysis state within the universe list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    #[default]
    Pending,
    Analyzing,
    Completed,
    Failed,
}

/// One row of the all-stocks universe list, keyed by `yahoo_symbol`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub yahoo_symbol: String,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: StockStatus,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub entry: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub has_analysis: bool,
}

/// `GET /all-stocks` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct AllStocksResponse {
    #[serde(default)]
    pub stocks: Vec<StockEntry>,
}

/// `POST /initialize-all-stocks` result.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializedUniverse {
    pub count: usize,
}

/// One watchlist membership record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A watchlist row enriched with the symbol's latest analysis, as the
/// dashboard renders it. This is what the `watchlist` cache key stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistRow {
    pub symbol: String,
    pub name: Option<String>,
    pub verdict: Option<String>,
    pub score: Option<f64>,
    pub has_analysis: bool,
}

/// One historical analysis for a symbol; the backend orders these
/// newest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub entry: Option<f64>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub analyzed_at: Option<String>,
}

/// `GET /all-stocks/{symbol}/history` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<AnalysisRecord>,
}

/// Request body for `POST /watchlist`.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistAddRequest {
    pub symbol: String,
    pub name: String,
}

/// Request body for `DELETE /watchlist`.
#[derive(Debug, Clone, Serialize)]
pub struct WatchlistRemoveRequest {
    pub symbol: String,
}
