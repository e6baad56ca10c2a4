//! Record reconciliation
//!
//! Each incoming record is matched against the store by ID and then created,
//! updated in place, or skipped by comparing last-modified instants. Records
//! are handled strictly one after another since both the lookup and the append
//! point depend on what the previous record wrote.

use super::store::{StoreHandle, TabularStore};
use crate::adapters::sheet::CellValue;
use crate::domain::timestamp::{format_cell, parse_cell, parse_instant, truncate_to_seconds};
use crate::domain::{ExternalRecord, RecordIssue, Result};
use crate::log_record_decision;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;

/// What to do with one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create { row: u32 },
    Update { row: u32 },
    Skip,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create { .. } => "create",
            Action::Update { .. } => "update",
            Action::Skip => "skip",
        }
    }
}

/// Per-batch tally of reconciliation actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationCounters {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Always zero: upstream deletions are not propagated
    pub deleted: usize,
}

impl ReconciliationCounters {
    pub fn record(&mut self, action: Action) {
        match action {
            Action::Create { .. } => self.created += 1,
            Action::Update { .. } => self.updated += 1,
            Action::Skip => self.skipped += 1,
        }
    }

    /// Whether any row was written
    pub fn mutated(&self) -> bool {
        self.created > 0 || self.updated > 0
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.deleted
    }
}

impl fmt::Display for ReconciliationCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "create:{}, update:{}, skip:{}, delete:{}",
            self.created, self.updated, self.skipped, self.deleted
        )
    }
}

/// Result of reconciling one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileOutcome {
    pub counters: ReconciliationCounters,

    /// Records skipped because a timestamp could not be parsed
    pub issues: Vec<RecordIssue>,

    /// Whether the sort pass ran
    pub sorted: bool,
}

/// A record whose timestamps have been parsed
#[derive(Debug, Clone)]
pub struct ParsedRecord<'r> {
    pub record: &'r ExternalRecord,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub updated: DateTime<Utc>,
}

impl<'r> ParsedRecord<'r> {
    /// Parses the record's timestamps
    ///
    /// # Errors
    ///
    /// A [`RecordIssue`] naming the first field that failed to parse.
    pub fn parse(record: &'r ExternalRecord) -> std::result::Result<Self, RecordIssue> {
        let field = |name: &str, raw: &str| {
            parse_instant(raw).map_err(|e| RecordIssue::new(record.id, format!("{name}: {e}")))
        };

        let updated = field("updated", &record.updated)?;
        let start = field("start", &record.start)?;
        let end = match record.end.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(field("end", raw)?),
            _ => None,
        };

        Ok(Self {
            record,
            start,
            end,
            updated,
        })
    }
}

/// Decides the action for one record
///
/// `existing` is the matching row and the instant parsed from its LAST_UPDATE
/// cell (`None` when that cell is unreadable). Instants are compared at whole
/// seconds; an equal or newer stored instant means skip.
pub fn decide(
    existing: Option<(u32, Option<DateTime<Utc>>)>,
    incoming: DateTime<Utc>,
    append_row: u32,
) -> Action {
    match existing {
        Some((_, Some(stored)))
            if truncate_to_seconds(stored) >= truncate_to_seconds(incoming) =>
        {
            Action::Skip
        }
        Some((row, _)) => Action::Update { row },
        None => Action::Create { row: append_row },
    }
}

/// Applies batches of records to a [`TabularStore`]
pub struct Reconciler<'a> {
    store: &'a TabularStore,
    tz: Tz,
    source_label: String,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a TabularStore, tz: Tz, source_label: impl Into<String>) -> Self {
        Self {
            store,
            tz,
            source_label: source_label.into(),
        }
    }

    /// Reconciles `records` into the store and sorts it if anything changed
    ///
    /// Malformed records are skipped and reported in the outcome; storage
    /// failures abort the batch.
    pub fn reconcile(&self, handle: &StoreHandle, records: &[ExternalRecord]) -> Result<ReconcileOutcome> {
        let mut outcome = ReconcileOutcome::default();

        for record in records {
            let parsed = match ParsedRecord::parse(record) {
                Ok(parsed) => parsed,
                Err(issue) => {
                    self.skip_malformed(&mut outcome, issue);
                    continue;
                }
            };

            let append_row = self.store.next_append_row(handle)?;
            let action = self.plan(Some(handle), &parsed, append_row)?;
            self.apply(handle, &parsed, action)?;
            outcome.counters.record(action);
        }

        tracing::info!(counters = %outcome.counters, "Reconciled batch");

        if outcome.counters.mutated() {
            let start_column = self.store.layout().columns.start;
            self.store.sort_data_area(handle, start_column, false)?;
            outcome.sorted = true;
        }

        Ok(outcome)
    }

    /// Plans every record without writing or sorting
    ///
    /// `handle = None` stands for a store that does not exist yet (or would be
    /// replaced by rotation), so every well-formed record plans as a create.
    /// Records sharing an ID within the batch each plan as a create, since
    /// nothing is written between them.
    pub fn plan_batch(&self, handle: Option<&StoreHandle>, records: &[ExternalRecord]) -> Result<ReconcileOutcome> {
        let mut outcome = ReconcileOutcome::default();
        let mut append_row = match handle {
            Some(handle) => self.store.next_append_row(handle)?,
            None => self.store.layout().origin.row,
        };

        for record in records {
            let parsed = match ParsedRecord::parse(record) {
                Ok(parsed) => parsed,
                Err(issue) => {
                    self.skip_malformed(&mut outcome, issue);
                    continue;
                }
            };

            let action = self.plan(handle, &parsed, append_row)?;
            if let Action::Create { .. } = action {
                append_row += 1;
            }
            outcome.counters.record(action);
        }

        tracing::info!(counters = %outcome.counters, "Planned batch (dry run)");
        Ok(outcome)
    }

    /// Looks the record up and decides its action
    pub fn plan(&self, handle: Option<&StoreHandle>, parsed: &ParsedRecord<'_>, append_row: u32) -> Result<Action> {
        let Some(handle) = handle else {
            return Ok(decide(None, parsed.updated, append_row));
        };

        let columns = self.store.layout().columns;
        let key = parsed.record.id.to_string();
        let existing = match self.store.locate_row(handle, &key, columns.id)? {
            Some(row) => {
                let cell = self.store.read_cell(handle, row, columns.last_update)?;
                let stored = parse_cell(&cell.to_string(), self.tz);
                if stored.is_none() {
                    tracing::warn!(
                        record_id = parsed.record.id,
                        row = row,
                        value = %cell,
                        "Unreadable LAST_UPDATE cell, row will be rewritten"
                    );
                }
                Some((row, stored))
            }
            None => None,
        };

        Ok(decide(existing, parsed.updated, append_row))
    }

    /// Writes the row for a create or update; skip writes nothing
    pub fn apply(&self, handle: &StoreHandle, parsed: &ParsedRecord<'_>, action: Action) -> Result<()> {
        let layout = self.store.layout();
        let (row, base) = match action {
            Action::Skip => {
                log_record_decision!(parsed.record.id, action.as_str());
                return Ok(());
            }
            Action::Create { row } => (row, vec![CellValue::Empty; layout.width() as usize]),
            Action::Update { row } => (
                row,
                self.store
                    .read_row(handle, row, layout.origin.column, layout.width())?,
            ),
        };

        let values = self.build_row(parsed, base);
        self.store
            .write_range(handle, &[values], row, layout.origin.column)?;
        log_record_decision!(parsed.record.id, action.as_str(), row);
        Ok(())
    }

    /// Lays the record's fields over `base` at their schema columns
    ///
    /// Cells of `base` outside the schema columns are kept as they are.
    pub fn build_row(&self, parsed: &ParsedRecord<'_>, mut base: Vec<CellValue>) -> Vec<CellValue> {
        let layout = self.store.layout();
        let columns = layout.columns;
        let record = parsed.record;
        base.resize(layout.width() as usize, CellValue::Empty);

        let fields = [
            (columns.id, id_cell(record.id)),
            (columns.subject, CellValue::text(record.description.clone())),
            (columns.start, CellValue::text(format_cell(parsed.start, self.tz))),
            (
                columns.end,
                parsed
                    .end
                    .map(|end| CellValue::text(format_cell(end, self.tz)))
                    .unwrap_or_default(),
            ),
            (
                columns.project,
                CellValue::text(record.project.clone().unwrap_or_default()),
            ),
            (columns.tag, CellValue::text(record.tag_cell())),
            (columns.source, CellValue::text(self.source_label.clone())),
            (
                columns.last_update,
                CellValue::text(format_cell(parsed.updated, self.tz)),
            ),
        ];

        for (column, value) in fields {
            base[(column - layout.origin.column) as usize] = value;
        }
        base
    }

    fn skip_malformed(&self, outcome: &mut ReconcileOutcome, issue: RecordIssue) {
        tracing::warn!(
            record_id = issue.record_id,
            reason = %issue.reason,
            "Skipping malformed record"
        );
        outcome.counters.skipped += 1;
        outcome.issues.push(issue);
    }
}

/// Largest id a spreadsheet number cell holds exactly (2^53)
const MAX_EXACT_ID: u64 = 1 << 53;

/// Ids that survive an f64 round trip are stored as numbers, larger ones as text
fn id_cell(id: u64) -> CellValue {
    if id <= MAX_EXACT_ID {
        CellValue::Number(id as f64)
    } else {
        CellValue::text(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sheet::MemoryBackend;
    use crate::config::StoreConfig;
    use crate::core::store::StoreLayout;
    use crate::domain::timestamp::parse_time_zone;
    use std::sync::Arc;

    fn instant(raw: &str) -> DateTime<Utc> {
        parse_instant(raw).unwrap()
    }

    fn tokyo() -> Tz {
        parse_time_zone("Asia/Tokyo").unwrap()
    }

    fn store() -> TabularStore {
        let backend = Arc::new(MemoryBackend::with_containers(["live"]));
        TabularStore::new(backend, StoreLayout::from(&StoreConfig::default()))
    }

    #[test]
    fn test_id_cell_keeps_large_ids_exact() {
        assert_eq!(id_cell(42), CellValue::Number(42.0));
        assert_eq!(id_cell(MAX_EXACT_ID), CellValue::Number(9_007_199_254_740_992.0));
        assert_eq!(
            id_cell(MAX_EXACT_ID + 1),
            CellValue::text("9007199254740993")
        );
    }

    #[test]
    fn test_decide_equal_timestamps_skip() {
        let t = instant("2024-01-01T10:00:00Z");
        assert_eq!(decide(Some((5, Some(t))), t, 9), Action::Skip);
    }

    #[test]
    fn test_decide_newer_incoming_updates() {
        let old = instant("2024-01-01T10:00:00Z");
        let new = instant("2024-01-01T10:00:01Z");
        assert_eq!(decide(Some((5, Some(old))), new, 9), Action::Update { row: 5 });
    }

    #[test]
    fn test_decide_older_incoming_skips() {
        let old = instant("2024-01-02T10:00:00Z");
        let new = instant("2024-01-01T10:00:00Z");
        assert_eq!(decide(Some((5, Some(old))), new, 9), Action::Skip);
    }

    #[test]
    fn test_decide_subsecond_difference_is_equal() {
        let old = instant("2024-01-01T10:00:00Z");
        let new = instant("2024-01-01T10:00:00.900Z");
        assert_eq!(decide(Some((5, Some(old))), new, 9), Action::Skip);
    }

    #[test]
    fn test_decide_unreadable_stored_value_updates() {
        let new = instant("2024-01-01T10:00:00Z");
        assert_eq!(decide(Some((5, None)), new, 9), Action::Update { row: 5 });
    }

    #[test]
    fn test_decide_absent_creates_at_append_row() {
        let new = instant("2024-01-01T10:00:00Z");
        assert_eq!(decide(None, new, 9), Action::Create { row: 9 });
    }

    #[test]
    fn test_parse_reports_bad_updated() {
        let record = ExternalRecord::new(3, "not a time");
        let issue = ParsedRecord::parse(&record).unwrap_err();
        assert_eq!(issue.record_id, 3);
        assert!(issue.reason.starts_with("updated"));
    }

    #[test]
    fn test_parse_treats_blank_end_as_running() {
        let record = ExternalRecord::new(3, "2024-01-01T10:00:00Z").with_end(" ");
        assert!(ParsedRecord::parse(&record).unwrap().end.is_none());
    }

    #[test]
    fn test_build_row_layout() {
        let store = store();
        let reconciler = Reconciler::new(&store, tokyo(), "toggl");
        let record = ExternalRecord::new(1234567890, "2024-01-01T10:00:05+09:00")
            .with_description("Write report")
            .with_start("2024-01-01T09:00:00+09:00")
            .with_end("2024-01-01T10:00:00+09:00")
            .with_project("Ledger")
            .with_tags(["deep", "writing"]);
        let parsed = ParsedRecord::parse(&record).unwrap();

        let row = reconciler.build_row(&parsed, Vec::new());
        assert_eq!(
            row,
            vec![
                CellValue::Number(1234567890.0),
                CellValue::text("Write report"),
                CellValue::text("2024/01/01 09:00:00"),
                CellValue::text("2024/01/01 10:00:00"),
                CellValue::text("Ledger"),
                CellValue::text("deep,writing"),
                CellValue::text("toggl"),
                CellValue::text("2024/01/01 10:00:05"),
            ]
        );
    }

    #[test]
    fn test_build_row_empty_optionals() {
        let store = store();
        let reconciler = Reconciler::new(&store, tokyo(), "toggl");
        let record = ExternalRecord::new(1, "2024-01-01T10:00:00Z");
        let parsed = ParsedRecord::parse(&record).unwrap();

        let row = reconciler.build_row(&parsed, Vec::new());
        assert_eq!(row[3], CellValue::Empty);
        assert_eq!(row[4], CellValue::Empty);
        assert_eq!(row[5], CellValue::Empty);
    }

    #[test]
    fn test_counters_display() {
        let mut counters = ReconciliationCounters::default();
        counters.record(Action::Create { row: 2 });
        counters.record(Action::Skip);
        assert_eq!(counters.to_string(), "create:1, update:0, skip:1, delete:0");
        assert!(counters.mutated());
        assert_eq!(counters.total(), 2);
    }
}
