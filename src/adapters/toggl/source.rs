//! Time report source trait

use crate::domain::{ExternalRecord, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Remote source of time-tracking records
///
/// Implementations return every record in the window in one batch, or an
/// error. A source that answers without a usable payload reports
/// [`SourceError::NoDataFetched`](crate::domain::SourceError::NoDataFetched).
#[async_trait]
pub trait TimeReportSource: Send + Sync {
    /// Fetches the records between `since` and `until` (inclusive dates)
    ///
    /// `until = None` leaves the window open-ended; `report_type = None` uses
    /// the configured report.
    async fn fetch(
        &self,
        since: NaiveDate,
        until: Option<NaiveDate>,
        report_type: Option<&str>,
    ) -> Result<Vec<ExternalRecord>>;
}
