//! Backend trait and structured transport errors.
//!
//! The `Backend` trait abstracts over the analysis server so the
//! orchestration layer can be exercised against a mock in tests. The real
//! implementation is `HttpBackend`.

use thiserror::Error;

use stockdash_core::job::StatusSnapshot;

use crate::types::{
    AllStocksProgress, AnalysisRecord, InitializedUniverse, JobCreated, StockEntry,
    WatchlistEntry,
};

/// Structured transport errors.
///
/// These describe the fetch itself failing; a job that ran and reported
/// `failed` is not an `ApiError`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("backend returned HTTP {code}")]
    Status { code: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("job not found: {job_id}")]
    JobNotFound { job_id: String },
}

/// The analysis backend's REST contract.
///
/// None of these calls retry automatically — submit and poll failures are
/// surfaced to the caller, which owns the state machine consequences.
pub trait Backend: Send + Sync {
    /// `POST /analyze` — start a job over explicit tickers.
    fn analyze(
        &self,
        tickers: &[String],
        indicators: Option<&[String]>,
    ) -> Result<JobCreated, ApiError>;

    /// `GET /status/{job_id}`.
    fn job_status(&self, job_id: &str) -> Result<StatusSnapshot, ApiError>;

    /// `POST /cancel/{job_id}` — fire-and-forget from the client's view.
    fn cancel_job(&self, job_id: &str) -> Result<(), ApiError>;

    /// `GET /all-stocks/progress`.
    fn all_stocks_progress(&self) -> Result<AllStocksProgress, ApiError>;

    /// `POST /initialize-all-stocks`.
    fn initialize_all_stocks(&self) -> Result<InitializedUniverse, ApiError>;

    /// `GET /all-stocks`.
    fn all_stocks(&self) -> Result<Vec<StockEntry>, ApiError>;

    /// `POST /analyze-all-stocks`; empty `symbols` means everything.
    fn analyze_all_stocks(&self, symbols: &[String]) -> Result<JobCreated, ApiError>;

    /// `GET /all-stocks/{symbol}/history`, newest-first.
    fn stock_history(&self, symbol: &str) -> Result<Vec<AnalysisRecord>, ApiError>;

    /// `GET /report/{ticker}` — the report body is backend-shaped JSON and
    /// is passed through opaquely.
    fn report(&self, ticker: &str) -> Result<serde_json::Value, ApiError>;

    /// `GET /report/{ticker}/download` — spreadsheet bytes.
    fn report_download(&self, ticker: &str) -> Result<Vec<u8>, ApiError>;

    /// `GET /watchlist`.
    fn watchlist(&self) -> Result<Vec<WatchlistEntry>, ApiError>;

    /// `POST /watchlist`.
    fn watchlist_add(&self, symbol: &str, name: &str) -> Result<(), ApiError>;

    /// `DELETE /watchlist`.
    fn watchlist_remove(&self, symbol: &str) -> Result<(), ApiError>;
}
