//! Logging and observability
//!
//! Structured logging with:
//! - Configurable log levels (overridable through `RUST_LOG`)
//! - Console output
//! - Optional JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use cadastre_ingest::logging::init_logging;
//! use cadastre_ingest::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(archives = 12, "Downloads finished");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use cadastre_ingest::log_stage_start;
///
/// log_stage_start!("promote");
/// ```
#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr) => {
        tracing::info!(stage = $stage, "Starting pipeline stage");
    };
}

/// Log the completion of a pipeline stage with its duration
///
/// # Example
///
/// ```no_run
/// use cadastre_ingest::log_stage_complete;
/// use std::time::Duration;
///
/// log_stage_complete!("promote", Duration::from_secs(42));
/// ```
#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $duration:expr) => {
        tracing::info!(
            stage = $stage,
            duration_ms = $duration.as_millis() as u64,
            "Pipeline stage completed"
        );
    };
}

/// Log download progress for a batch
///
/// # Example
///
/// ```no_run
/// use cadastre_ingest::log_download_progress;
///
/// log_download_progress!(3, 10);
/// ```
#[macro_export]
macro_rules! log_download_progress {
    ($done:expr, $total:expr) => {
        tracing::debug!(
            done = $done,
            total = $total,
            progress_pct = ($done as f64 / ($total as f64).max(1.0) * 100.0),
            "Download progress"
        );
    };
}
