//! Timestamp conventions shared by the reconciler and the log rotator
//!
//! Incoming records carry RFC 3339 timestamps. Cells hold
//! `yyyy/MM/dd HH:mm:ss` rendered in one fixed time zone, and comparisons are
//! always made on parsed instants, never on the strings.

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// chrono pattern for `yyyy/MM/dd HH:mm:ss`
pub const CELL_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// chrono pattern for the date stamp appended to archive names
pub const ARCHIVE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an IANA time zone name such as `Asia/Tokyo`
pub fn parse_time_zone(name: &str) -> Result<Tz, String> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| format!("Invalid time zone '{name}': {e}"))
}

/// Parses an RFC 3339 timestamp from the report source
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
}

/// Renders an instant as a cell value in the given zone
pub fn format_cell(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(CELL_FORMAT).to_string()
}

/// Parses a cell value written by [`format_cell`]
///
/// Returns `None` when the cell does not hold a timestamp in the cell format.
pub fn parse_cell(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), CELL_FORMAT).ok()?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Drops sub-second precision; cells only keep whole seconds
pub fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.with_nanosecond(0).unwrap_or(instant)
}

/// Date stamp used in archive names, taken in the given zone
pub fn archive_date(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format(ARCHIVE_DATE_FORMAT).to_string()
}
