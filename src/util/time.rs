//! Timestamp encoding for stored rows.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Encode a timestamp for storage (RFC3339, nanosecond precision, `Z` suffix).
///
/// The fixed width keeps lexical order equal to chronological order.
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Decode a stored timestamp.
///
/// Accepts RFC3339 and the bare `YYYY-MM-DD HH:MM:SS` form `SQLite` produces
/// for `datetime('now')`.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
