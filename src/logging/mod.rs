//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - console output, always on
//! - JSON log files with daily or hourly rotation, when enabled
//! - `RUST_LOG` overrides the configured level
//!
//! # Example
//!
//! ```no_run
//! use toggl_ledger::logging::init_logging;
//! use toggl_ledger::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, sync_run_span, LoggingGuard};

/// Log the start of a sync run
///
/// # Example
///
/// ```no_run
/// use toggl_ledger::log_sync_start;
///
/// log_sync_start!("2024-01-01", None::<String>, false);
/// ```
#[macro_export]
macro_rules! log_sync_start {
    ($since:expr, $until:expr, $dry_run:expr) => {
        tracing::info!(
            since = %$since,
            until = ?$until,
            dry_run = $dry_run,
            "Starting sync"
        );
    };
}

/// Log the action decided for one record
///
/// # Example
///
/// ```no_run
/// use toggl_ledger::log_record_decision;
///
/// log_record_decision!(1234567890u64, "create", 17u32);
/// ```
#[macro_export]
macro_rules! log_record_decision {
    ($record_id:expr, $action:expr, $row:expr) => {
        tracing::debug!(
            record_id = $record_id,
            action = $action,
            row = $row,
            "Reconciled record"
        );
    };
    ($record_id:expr, $action:expr) => {
        tracing::debug!(
            record_id = $record_id,
            action = $action,
            "Reconciled record"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use toggl_ledger::log_retry_attempt;
///
/// log_retry_attempt!("fetch report", 2, 3, 2000u64, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($operation:expr, $attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            operation = $operation,
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
