//! Structured JSONL logging plus human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (`$XDG_STATE_HOME/gatekeeper/gatekeeper.jsonl`) - one JSON object per line
//! - **Compact to stderr** - for whoever is watching the service in a terminal
//!
//! # Usage
//!
//! ```rust,ignore
//! use gatekeeper::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init(None, false);
//!
//! tracing::info!(event_type = "session", session = %handle, "Session created");
//! ```

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "gatekeeper.jsonl";
const DEFAULT_FILTER: &str = "info,zbus=warn";
const VERBOSE_FILTER: &str = "debug,zbus=info";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// `RUST_LOG` always wins. Otherwise `default_filter` (from config) is used,
/// then the built-in default; `verbose` swaps the built-in default for a
/// debug-level one.
pub fn init(default_filter: Option<&str>, verbose: bool) -> LoggingGuard {
    let log_path = log_path();
    if let Some(dir) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("[LOGGING] Failed to create log directory: {}", e);
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eprintln!("[LOGGING] Failed to open log file: {}", e))
        .ok();

    let fallback = match (default_filter, verbose) {
        (_, true) => VERBOSE_FILTER,
        (Some(filter), false) => filter,
        (None, false) => DEFAULT_FILTER,
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // Compact layer for stderr
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let (json_layer, file_guard) = match file {
        Some(file) => {
            // Non-blocking writer so a slow disk never stalls the event loop
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(stderr_layer)
        .init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Directory holding the JSONL log (`$XDG_STATE_HOME/gatekeeper`).
fn get_log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("state")))
        .map(|d| d.join("gatekeeper"))
        .unwrap_or_else(|| std::env::temp_dir().join("gatekeeper-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_file_name() {
        let path = log_path();
        assert_eq!(path.file_name().unwrap(), LOG_FILE_NAME);
        assert!(path
            .parent()
            .unwrap()
            .to_string_lossy()
            .contains("gatekeeper"));
    }
}
