//! File-only tracing setup.
//!
//! The TUI owns the terminal, so nothing is written to stdout or stderr.
//! Logs go to daily rolling JSON files under the user data directory.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE: &str = "finsight.log";

pub fn log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("finsight").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Initialize logging. Keep the returned guard alive until exit so buffered
/// lines are flushed.
pub fn init() -> WorkerGuard {
    let log_dir = log_dir();
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(file_layer).init();

    tracing::info!(dir = %log_dir.display(), "logging initialized");

    guard
}
