//! Client configuration: where the backend lives.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the configured base URL.
pub const API_URL_ENV: &str = "STOCKDASH_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL, no trailing slash.
    pub base_url: String,
    /// HTTP request timeout. The orchestration layer imposes no timeout of
    /// its own; a stalled poll simply delays the next tick.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Load config from a TOML file, falling back to defaults if the file is
/// missing or corrupt, then apply the environment override.
pub fn load(path: &Path) -> ClientConfig {
    let config = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            log::warn!("config file {} failed to parse: {e}", path.display());
            ClientConfig::default()
        }),
        Err(_) => ClientConfig::default(),
    };
    with_override(config, std::env::var(API_URL_ENV).ok())
}

fn with_override(mut config: ClientConfig, base_url: Option<String>) -> ClientConfig {
    if let Some(url) = base_url {
        if !url.is_empty() {
            config.base_url = url.trim_end_matches('/').to_string();
        }
    }
    config
}
