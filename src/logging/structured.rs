//! Subscriber setup for the CLI and a span for sync runs
//!
//! The console gets compact human-readable lines. With
//! `logging.local_enabled` a second layer writes JSON lines to a rolling
//! `toggl-ledger.log`, recording each `sync_run` span as it opens and closes
//! so a file carries the window and outcome of every run.

use crate::config::LoggingConfig;
use crate::domain::{Result, SyncError};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{Level, Span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const LOG_FILE_PREFIX: &str = "toggl-ledger.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the background log writer alive; dropping it flushes pending lines
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Installs the global subscriber
///
/// `RUST_LOG` wins over `level` when set. Fails with
/// [`SyncError::Configuration`] on an unknown level or when the log
/// directory cannot be created.
///
/// ```no_run
/// use toggl_ledger::config::LoggingConfig;
/// use toggl_ledger::logging::init_logging;
///
/// let _guard = init_logging("debug", &LoggingConfig::default()).expect("logging");
/// ```
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = crate_filter(parse_log_level(level)?);

    let console = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_filter(filter.clone())
        .boxed();
    let mut layers: Vec<BoxedLayer> = vec![console];

    let file_writer = if config.local_enabled {
        let (layer, guard) = json_file_layer(config, filter)?;
        layers.push(layer);
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry().with(layers).init();
    tracing::debug!(
        file_logging = config.local_enabled,
        path = %config.local_path,
        rotation = %config.local_rotation,
        "Logging ready"
    );

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}

/// Span covering one sync run; every event of the run is nested under it
pub fn sync_run_span(since: NaiveDate, until: Option<NaiveDate>, dry_run: bool) -> Span {
    let until = until.map_or_else(|| "open".to_string(), |d| d.to_string());
    tracing::info_span!("sync_run", since = %since, until = %until, dry_run = dry_run)
}

fn crate_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("toggl_ledger={level}")))
}

fn json_file_layer(config: &LoggingConfig, filter: EnvFilter) -> Result<(BoxedLayer, WorkerGuard)> {
    let dir = Path::new(&config.local_path);
    std::fs::create_dir_all(dir).map_err(|e| {
        SyncError::Configuration(format!("cannot create log directory {}: {e}", dir.display()))
    })?;

    let appender = RollingFileAppender::new(rotation_for(config), dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(writer)
        .with_filter(filter)
        .boxed();
    Ok((layer, guard))
}

fn rotation_for(config: &LoggingConfig) -> Rotation {
    if config.local_rotation == "hourly" {
        Rotation::HOURLY
    } else {
        Rotation::DAILY
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    let known = ["trace", "debug", "info", "warn", "error"];
    let lowered = level.to_ascii_lowercase();
    if !known.contains(&lowered.as_str()) {
        return Err(SyncError::Configuration(format!(
            "unknown log level '{level}', expected one of: {}",
            known.join(", ")
        )));
    }
    lowered
        .parse()
        .map_err(|_| SyncError::Configuration(format!("unknown log level '{level}'")))
}
