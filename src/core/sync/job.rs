//! Sync job orchestration
//!
//! One run: fetch the window from the source, open (and if needed rotate) the
//! live store, reconcile the batch, and report the counters.

use super::summary::SyncSummary;
use crate::adapters::sheet::SheetBackend;
use crate::adapters::toggl::TimeReportSource;
use crate::config::LedgerConfig;
use crate::core::reconcile::Reconciler;
use crate::core::retry::RetryPolicy;
use crate::core::rotation::{needs_rotation, LogRotator, RotationTarget};
use crate::core::store::{StoreLayout, TabularStore};
use crate::domain::timestamp::archive_date;
use crate::domain::{Result, SourceError, SyncError};
use crate::log_sync_start;
use crate::logging::sync_run_span;
use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Per-run overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Plan only; overrides `application.dry_run` when set
    pub dry_run: bool,

    /// First day to fetch instead of `today - lookback_days`
    pub since: Option<NaiveDate>,

    /// Last day to fetch instead of the configured bound
    pub until: Option<NaiveDate>,
}

/// One reconciliation cycle over an explicit configuration
pub struct SyncJob {
    config: LedgerConfig,
    source: Arc<dyn TimeReportSource>,
    store: TabularStore,
    tz: Tz,
    fetch_retry: RetryPolicy,
    store_retry: RetryPolicy,
}

impl SyncJob {
    /// Builds a job from its collaborators
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] if the configured time zone is invalid.
    pub fn new(
        config: LedgerConfig,
        source: Arc<dyn TimeReportSource>,
        backend: Arc<dyn SheetBackend>,
    ) -> Result<Self> {
        let tz = config.application.tz().map_err(SyncError::Configuration)?;
        let store = TabularStore::new(backend, StoreLayout::from(&config.store));
        let fetch_retry = RetryPolicy::new(&config.toggl.retry);
        let store_retry = RetryPolicy::new(&config.store.retry);

        Ok(Self {
            config,
            source,
            store,
            tz,
            fetch_retry,
            store_retry,
        })
    }

    /// Replaces the retry policies built from the configuration
    pub fn with_retry_policies(mut self, fetch: RetryPolicy, store: RetryPolicy) -> Self {
        self.fetch_retry = fetch;
        self.store_retry = store;
        self
    }

    pub fn store(&self) -> &TabularStore {
        &self.store
    }

    /// Fetch window for a run on `today`
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] when the window ends before it starts.
    pub fn fetch_window(
        &self,
        today: NaiveDate,
        options: &SyncOptions,
    ) -> Result<(NaiveDate, Option<NaiveDate>)> {
        let days_ago = |days: u32| {
            today
                .checked_sub_days(Days::new(u64::from(days)))
                .ok_or_else(|| SyncError::Configuration(format!("{days} days before {today} is out of range")))
        };

        let since = match options.since {
            Some(since) => since,
            None => days_ago(self.config.sync.lookback_days)?,
        };
        let until = match (options.until, self.config.sync.until_days_ago) {
            (Some(until), _) => Some(until),
            (None, Some(days)) => Some(days_ago(days)?),
            (None, None) => None,
        };

        if let Some(until) = until {
            if until < since {
                return Err(SyncError::Configuration(format!(
                    "fetch window ends ({until}) before it starts ({since})"
                )));
            }
        }
        Ok((since, until))
    }

    /// Runs one cycle now
    pub async fn run(&self, options: SyncOptions) -> Result<SyncSummary> {
        self.run_at(Utc::now(), options).await
    }

    /// Runs one cycle as if the current instant were `now`
    ///
    /// `now` decides the fetch window and the archive date stamp.
    pub async fn run_at(&self, now: DateTime<Utc>, options: SyncOptions) -> Result<SyncSummary> {
        let started = Instant::now();
        let dry_run = options.dry_run || self.config.application.dry_run;
        let today = now.with_timezone(&self.tz).date_naive();
        let (since, until) = self.fetch_window(today, &options)?;

        self.run_window(now, since, until, dry_run, started)
            .instrument(sync_run_span(since, until, dry_run))
            .await
    }

    async fn run_window(
        &self,
        now: DateTime<Utc>,
        since: NaiveDate,
        until: Option<NaiveDate>,
        dry_run: bool,
        started: Instant,
    ) -> Result<SyncSummary> {
        log_sync_start!(since, until, dry_run);
        let mut summary = SyncSummary::new(since, until, dry_run);

        let records = self
            .fetch_retry
            .run("fetch report", || self.source.fetch(since, until, None))
            .await?;
        if records.is_empty() {
            return Err(SourceError::NoDataFetched(format!(
                "no records between {since} and {}",
                until.map_or_else(|| "now".to_string(), |d| d.to_string())
            ))
            .into());
        }
        summary.fetched = records.len();
        tracing::info!(fetched = records.len(), "Fetched records");

        let rotator = LogRotator::new(&self.store, RotationTarget::from(&self.config.store));
        let existing = self
            .store_retry
            .run("open store", || async { rotator.find_live() })
            .await?;

        let reconciler = Reconciler::new(&self.store, self.tz, self.config.sync.source_label.clone());

        let outcome = if dry_run {
            let plan_target = match existing {
                Some(handle) => {
                    let last_row = self.store.last_row(&handle)?;
                    if needs_rotation(last_row, self.store.layout().capacity_threshold) {
                        tracing::info!(store = %handle.file, last_row = last_row, "Dry run: store would be rotated");
                        None
                    } else {
                        summary.store = Some(handle.file.to_string());
                        Some(handle)
                    }
                }
                None => {
                    tracing::info!(
                        container = %rotator.target().live_container,
                        name = %rotator.target().store_name,
                        "Dry run: store would be created"
                    );
                    None
                }
            };
            reconciler.plan_batch(plan_target.as_ref(), &records)?
        } else {
            let opened = rotator.open_or_rotate(existing, &archive_date(now, self.tz))?;
            summary.store = Some(opened.handle.file.to_string());
            summary.rotated_to = opened.rotated_to.map(|file| file.to_string());
            reconciler.reconcile(&opened.handle, &records)?
        };

        summary.counters = outcome.counters;
        summary.malformed = outcome.issues;
        let summary = summary.with_duration(started.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}
