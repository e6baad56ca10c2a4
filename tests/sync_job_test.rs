//! End-to-end tests of a sync run with a scripted report source

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use toggl_ledger::adapters::sheet::{
    BackendOp, CellValue, MemoryBackend, SheetBackend, SheetBook, StoredFile, WorkbookBackend,
};
use toggl_ledger::adapters::toggl::TimeReportSource;
use toggl_ledger::config::{parse_config, LedgerConfig, RetryConfig};
use toggl_ledger::core::retry::RetryPolicy;
use toggl_ledger::core::sync::{SyncJob, SyncOptions};
use toggl_ledger::domain::{ExternalRecord, Result, SourceError, SyncError};

/// Source that answers each fetch from a queue of scripted responses
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<ExternalRecord>>>>,
    windows: Mutex<Vec<(NaiveDate, Option<NaiveDate>)>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Vec<ExternalRecord>>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            windows: Mutex::new(Vec::new()),
        })
    }

    fn returning(records: Vec<ExternalRecord>) -> Arc<Self> {
        Self::new(vec![Ok(records)])
    }

    fn calls(&self) -> usize {
        self.windows.lock().unwrap().len()
    }
}

#[async_trait]
impl TimeReportSource for ScriptedSource {
    async fn fetch(
        &self,
        since: NaiveDate,
        until: Option<NaiveDate>,
        _report_type: Option<&str>,
    ) -> Result<Vec<ExternalRecord>> {
        self.windows.lock().unwrap().push((since, until));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn config(directory: &str, extra: &str) -> LedgerConfig {
    parse_config(&format!(
        r#"
[toggl]
api_token = "t"
user_agent = "me@example.com"
workspace_id = "1"

[store]
directory = "{directory}"
{extra}
"#
    ))
    .unwrap()
}

fn now() -> DateTime<Utc> {
    // 2024-05-02 10:00 in Tokyo
    "2024-05-02T01:00:00Z".parse().unwrap()
}

fn entry(id: u64, day: u32, updated_hour: u32) -> ExternalRecord {
    ExternalRecord::new(id, format!("2024-05-{day:02}T{updated_hour:02}:00:00+09:00"))
        .with_description(format!("entry {id}"))
        .with_start(format!("2024-05-{day:02}T08:00:00+09:00"))
        .with_end(format!("2024-05-{day:02}T09:00:00+09:00"))
        .with_project("Ledger")
}

fn job(config: LedgerConfig, source: Arc<ScriptedSource>, backend: Arc<dyn SheetBackend>) -> SyncJob {
    SyncJob::new(config, source, backend)
        .unwrap()
        .with_retry_policies(RetryPolicy::none(), RetryPolicy::none())
}

fn live() -> StoredFile {
    StoredFile::new("ledger", "schedule_latest")
}

#[tokio::test]
async fn test_first_run_creates_store_and_rows() {
    let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
    let source = ScriptedSource::returning(vec![entry(1, 1, 9), entry(2, 2, 9)]);
    let job = job(config("ledger", ""), source.clone(), backend.clone());

    let summary = job.run_at(now(), SyncOptions::default()).await.unwrap();

    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.counters.created, 2);
    assert_eq!(summary.store.as_deref(), Some("ledger/schedule_latest"));
    assert!(summary.rotated_to.is_none());
    assert!(summary.is_clean());

    // Yesterday in Tokyo onwards
    let windows = source.windows.lock().unwrap().clone();
    assert_eq!(
        windows,
        vec![(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), None)]
    );

    let grid = backend.grid(&live(), "log").unwrap();
    assert_eq!(grid.last_row(), 3);
    assert_eq!(grid.get(2, 1), CellValue::Number(2.0));
    assert_eq!(grid.get(3, 1), CellValue::Number(1.0));
}

#[tokio::test]
async fn test_repeated_run_skips_everything() {
    let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
    let batch = vec![entry(1, 1, 9), entry(2, 2, 9)];
    let source = ScriptedSource::new(vec![Ok(batch.clone()), Ok(batch)]);
    let job = job(config("ledger", ""), source, backend.clone());

    job.run_at(now(), SyncOptions::default()).await.unwrap();
    let before = backend.grid(&live(), "log").unwrap();
    let sorts = backend.calls(BackendOp::Sort);

    let summary = job.run_at(now(), SyncOptions::default()).await.unwrap();

    assert_eq!(summary.counters.skipped, 2);
    assert_eq!(summary.counters.created + summary.counters.updated, 0);
    assert_eq!(backend.grid(&live(), "log").unwrap(), before);
    assert_eq!(backend.calls(BackendOp::Sort), sorts);
}

#[tokio::test]
async fn test_full_store_rotates_before_batch() {
    let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
    let mut book = SheetBook::with_sheet("log");
    if let Some(grid) = book.sheet_mut("log") {
        for row in 1..=5 {
            grid.set(row, 1, CellValue::Number(f64::from(100 + row))).unwrap();
        }
    }
    backend.insert_file("ledger", "schedule_latest", book);

    let source = ScriptedSource::returning(vec![entry(1, 1, 9)]);
    let job = job(
        config("ledger", "capacity_threshold = 5"),
        source,
        backend.clone(),
    );

    let summary = job.run_at(now(), SyncOptions::default()).await.unwrap();

    assert_eq!(
        summary.rotated_to.as_deref(),
        Some("ledger/schedule_latest_2024-05-02")
    );
    assert_eq!(summary.counters.created, 1);

    let archive = StoredFile::new("ledger", "schedule_latest_2024-05-02");
    assert_eq!(backend.grid(&archive, "log").unwrap().last_row(), 5);
    let fresh = backend.grid(&live(), "log").unwrap();
    assert_eq!(fresh.last_row(), 2);
    assert_eq!(fresh.get(2, 1), CellValue::Number(1.0));
}

#[tokio::test]
async fn test_rotation_failure_aborts_run() {
    let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
    let mut book = SheetBook::with_sheet("log");
    if let Some(grid) = book.sheet_mut("log") {
        for row in 1..=5 {
            grid.set(row, 1, CellValue::Number(f64::from(row))).unwrap();
        }
    }
    backend.insert_file("ledger", "schedule_latest", book);
    backend.fail_always(BackendOp::Rename);

    let source = ScriptedSource::returning(vec![entry(1, 1, 9)]);
    let job = job(
        config("ledger", "capacity_threshold = 5"),
        source,
        backend.clone(),
    );

    let err = job.run_at(now(), SyncOptions::default()).await.unwrap_err();

    assert!(matches!(err, SyncError::Rotation(_)));
    assert_eq!(backend.calls(BackendOp::Write), 0);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
    let source = ScriptedSource::returning(vec![entry(1, 1, 9), entry(2, 2, 9)]);
    let job = job(config("ledger", ""), source, backend.clone());

    let options = SyncOptions {
        dry_run: true,
        ..Default::default()
    };
    let summary = job.run_at(now(), options).await.unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.counters.created, 2);
    assert!(backend.file_names("ledger").is_empty());
    assert_eq!(backend.calls(BackendOp::Create), 0);
    assert_eq!(backend.calls(BackendOp::Write), 0);
}

#[tokio::test]
async fn test_malformed_records_do_not_stop_the_batch() {
    let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
    let bad = ExternalRecord::new(3, "2024-05-01T09:00:00+09:00").with_start("not a time");
    let source = ScriptedSource::returning(vec![entry(1, 1, 9), bad, entry(2, 2, 9)]);
    let job = job(config("ledger", ""), source, backend.clone());

    let summary = job.run_at(now(), SyncOptions::default()).await.unwrap();

    assert!(!summary.is_clean());
    assert_eq!(summary.malformed.len(), 1);
    assert_eq!(summary.malformed[0].record_id, 3);
    assert_eq!(summary.counters.created, 2);
    assert_eq!(summary.counters.skipped, 1);
}

#[tokio::test]
async fn test_source_failure_touches_no_store() {
    let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
    let source = ScriptedSource::new(vec![Err(SourceError::AuthenticationFailed(
        "bad token".to_string(),
    )
    .into())]);
    let job = job(config("ledger", ""), source, backend.clone());

    let err = job.run_at(now(), SyncOptions::default()).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Source(SourceError::AuthenticationFailed(_))
    ));
    assert_eq!(backend.calls(BackendOp::Find), 0);
}

#[tokio::test]
async fn test_empty_report_is_source_unavailable() {
    let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
    let job = job(
        config("ledger", ""),
        ScriptedSource::returning(Vec::new()),
        backend.clone(),
    );

    let err = job.run_at(now(), SyncOptions::default()).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Source(SourceError::NoDataFetched(_))
    ));
    assert!(backend.file_names("ledger").is_empty());
}

#[tokio::test]
async fn test_transient_fetch_failure_is_retried() {
    let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
    let source = ScriptedSource::new(vec![
        Err(SourceError::Timeout("slow".to_string()).into()),
        Ok(vec![entry(1, 1, 9)]),
    ]);
    let fast = RetryPolicy::new(&RetryConfig {
        max_retries: 3,
        initial_delay_ms: 1,
        max_delay_ms: 2,
        backoff_multiplier: 2.0,
    });
    let job = SyncJob::new(config("ledger", ""), source.clone(), backend)
        .unwrap()
        .with_retry_policies(fast, RetryPolicy::none());

    let summary = job.run_at(now(), SyncOptions::default()).await.unwrap();

    assert_eq!(source.calls(), 2);
    assert_eq!(summary.counters.created, 1);
}

#[tokio::test]
async fn test_unreachable_store_is_storage_error() {
    let backend = Arc::new(MemoryBackend::default());
    let job = job(
        config("ledger", ""),
        ScriptedSource::returning(vec![entry(1, 1, 9)]),
        backend,
    );

    let err = job.run_at(now(), SyncOptions::default()).await.unwrap_err();

    assert!(matches!(err, SyncError::Storage(_)));
}

#[tokio::test]
async fn test_workbook_store_round_trips_between_runs() {
    let dir = TempDir::new().unwrap();
    let directory = dir.path().to_string_lossy().into_owned();
    let batch = vec![entry(11, 1, 9), entry(12, 2, 9), entry(10, 3, 9)];

    let first = job(
        config(&directory, ""),
        ScriptedSource::returning(batch.clone()),
        Arc::new(WorkbookBackend::new()),
    );
    let summary = first.run_at(now(), SyncOptions::default()).await.unwrap();
    assert_eq!(summary.counters.created, 3);
    assert!(dir.path().join("schedule_latest.xlsx").is_file());

    // A fresh backend has to read everything back from disk
    let backend = Arc::new(WorkbookBackend::new());
    let second = job(
        config(&directory, ""),
        ScriptedSource::returning(batch),
        backend.clone(),
    );
    let summary = second.run_at(now(), SyncOptions::default()).await.unwrap();
    assert_eq!(summary.counters.skipped, 3);

    let file = StoredFile::new(directory.clone(), "schedule_latest");
    let ids = backend.read_range(&file, "log", 2, 1, 3, 1).unwrap();
    let ids: Vec<String> = ids.iter().map(|row| row[0].to_string()).collect();
    assert_eq!(ids, vec!["10", "12", "11"]);
}
