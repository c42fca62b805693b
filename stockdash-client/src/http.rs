//! HTTP backend over reqwest's blocking client.
//!
//! Maps transport failures and status codes into the `ApiError` taxonomy.
//! No automatic retries: submit and poll failures surface to the caller,
//! whose state machine decides what happens next.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use stockdash_core::job::StatusSnapshot;

use crate::backend::{ApiError, Backend};
use crate::config::ClientConfig;
use crate::types::{
    AllStocksProgress, AllStocksResponse, AnalysisRecord, AnalyzeAllRequest, AnalyzeRequest,
    HistoryResponse, InitializedUniverse, JobCreated, StockEntry, WatchlistAddRequest,
    WatchlistEntry, WatchlistRemoveRequest,
};

pub struct HttpBackend {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .map_err(transport_error)?;
        decode(path, resp)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(transport_error)?;
        decode(path, resp)
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    ApiError::NetworkUnreachable(e.to_string())
}

fn decode<T: DeserializeOwned>(
    path: &str,
    resp: reqwest::blocking::Response,
) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            code: status.as_u16(),
        });
    }
    resp.json()
        .map_err(|e| ApiError::ResponseFormatChanged(format!("{path}: {e}")))
}

impl Backend for HttpBackend {
    fn analyze(
        &self,
        tickers: &[String],
        indicators: Option<&[String]>,
    ) -> Result<JobCreated, ApiError> {
        self.post_json(
            "/analyze",
            &AnalyzeRequest {
                tickers: tickers.to_vec(),
                indicators: indicators.map(<[String]>::to_vec),
            },
        )
    }

    fn job_status(&self, job_id: &str) -> Result<StatusSnapshot, ApiError> {
        match self.get_json(&format!("/status/{job_id}")) {
            Err(ApiError::Status { code: 404 }) => Err(ApiError::JobNotFound {
                job_id: job_id.to_string(),
            }),
            other => other,
        }
    }

    fn cancel_job(&self, job_id: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url(&format!("/cancel/{job_id}")))
            .send()
            .map_err(transport_error)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status {
                code: status.as_u16(),
            })
        }
    }

    fn all_stocks_progress(&self) -> Result<AllStocksProgress, ApiError> {
        self.get_json("/all-stocks/progress")
    }

    fn initialize_all_stocks(&self) -> Result<InitializedUniverse, ApiError> {
        // Empty JSON body; the endpoint takes no parameters.
        self.post_json("/initialize-all-stocks", &serde_json::json!({}))
    }

    fn all_stocks(&self) -> Result<Vec<StockEntry>, ApiError> {
        let resp: AllStocksResponse = self.get_json("/all-stocks")?;
        Ok(resp.stocks)
    }

    fn analyze_all_stocks(&self, symbols: &[String]) -> Result<JobCreated, ApiError> {
        self.post_json(
            "/analyze-all-stocks",
            &AnalyzeAllRequest {
                symbols: symbols.to_vec(),
            },
        )
    }

    fn stock_history(&self, symbol: &str) -> Result<Vec<AnalysisRecord>, ApiError> {
        let resp: HistoryResponse = self.get_json(&format!("/all-stocks/{symbol}/history"))?;
        Ok(resp.history)
    }

    fn report(&self, ticker: &str) -> Result<serde_json::Value, ApiError> {
        self.get_json(&format!("/report/{ticker}"))
    }

    fn report_download(&self, ticker: &str) -> Result<Vec<u8>, ApiError> {
        let path = format!("/report/{ticker}/download");
        let resp = self
            .client
            .get(self.url(&path))
            .send()
            .map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
            });
        }
        let bytes = resp
            .bytes()
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn watchlist(&self) -> Result<Vec<WatchlistEntry>, ApiError> {
        self.get_json("/watchlist")
    }

    fn watchlist_add(&self, symbol: &str, name: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self.post_json(
            "/watchlist",
            &WatchlistAddRequest {
                symbol: symbol.to_string(),
                name: name.to_string(),
            },
        )?;
        Ok(())
    }

    fn watchlist_remove(&self, symbol: &str) -> Result<(), ApiError> {
        let resp = self
            .client
            .delete(self.url("/watchlist"))
            .json(&WatchlistRemoveRequest {
                symbol: symbol.to_string(),
            })
            .send()
            .map_err(transport_error)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Status {
                code: status.as_u16(),
            })
        }
    }
}
