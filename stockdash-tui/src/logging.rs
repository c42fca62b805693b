//! File logging setup.
//!
//! The terminal belongs to ratatui, so log records go to a file under the
//! app's data directory.

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{Config, ConfigBuilder, WriteLogger};

/// Initialize the file logger. Logging is best-effort: if the file cannot be
/// created the app runs without logs.
pub fn initialize(log_path: &Path) {
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match File::create(log_path) {
        Ok(file) => {
            let _ = WriteLogger::init(LevelFilter::Info, build_config(), file);
        }
        Err(err) => {
            eprintln!(
                "Warning: could not create log file at {}: {err}",
                log_path.display()
            );
        }
    }
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}
