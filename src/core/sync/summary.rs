//! Summary of one sync run

use crate::core::reconcile::ReconciliationCounters;
use crate::domain::RecordIssue;
use chrono::NaiveDate;
use std::time::Duration;

/// What a sync run fetched, decided and wrote
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSummary {
    /// First day of the fetch window
    pub since: NaiveDate,

    /// Last day of the fetch window, if bounded
    pub until: Option<NaiveDate>,

    /// Records returned by the source
    pub fetched: usize,

    /// Actions taken (or planned, in a dry run)
    pub counters: ReconciliationCounters,

    /// Live store the batch went into, as `container/name`
    pub store: Option<String>,

    /// Archive the previous store was rotated to
    pub rotated_to: Option<String>,

    /// Records skipped because they could not be parsed
    pub malformed: Vec<RecordIssue>,

    /// Whether writes were suppressed
    pub dry_run: bool,

    /// Wall time of the run
    pub duration: Duration,
}

impl SyncSummary {
    /// Empty summary for a window
    pub fn new(since: NaiveDate, until: Option<NaiveDate>, dry_run: bool) -> Self {
        Self {
            since,
            until,
            fetched: 0,
            counters: ReconciliationCounters::default(),
            store: None,
            rotated_to: None,
            malformed: Vec::new(),
            dry_run,
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// True when every fetched record could be interpreted
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }

    pub fn log_summary(&self) {
        tracing::info!(
            since = %self.since,
            until = ?self.until,
            fetched = self.fetched,
            created = self.counters.created,
            updated = self.counters.updated,
            skipped = self.counters.skipped,
            deleted = self.counters.deleted,
            store = ?self.store,
            rotated_to = ?self.rotated_to,
            dry_run = self.dry_run,
            duration_ms = self.duration.as_millis() as u64,
            "Sync completed"
        );

        if !self.malformed.is_empty() {
            tracing::warn!(
                malformed = self.malformed.len(),
                "Sync completed with malformed records"
            );
            for issue in &self.malformed {
                tracing::warn!(
                    record_id = issue.record_id,
                    reason = %issue.reason,
                    "Malformed record"
                );
            }
        }
    }
}
