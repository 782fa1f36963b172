//! Timestamp encoding for stored rows.
//!
//! Timestamps are stored as RFC 3339 UTC text with a fixed nanosecond fraction, so
//! lexicographic order in SQLite matches chronological order and values round-trip
//! exactly. Only years 0 through 9999 have that form, so stored values are limited
//! to that range.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};

use crate::Error;

const FIRST_YEAR: i32 = 0;
const LAST_YEAR: i32 = 9999;

const EARLIEST: &str = "0000-01-01T00:00:00.000000000Z";
const LATEST: &str = "9999-12-31T23:59:59.999999999Z";

/// Encode a timestamp to be stored in a row.
pub(crate) fn encode(ts: &DateTime<Utc>) -> Result<String, Error> {
    if !(FIRST_YEAR..=LAST_YEAR).contains(&ts.year()) {
        return Err(Error::InvalidOption(format!(
            "timestamp {ts} is outside years {FIRST_YEAR} to {LAST_YEAR}"
        )));
    }
    Ok(ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Encode a comparison bound, clamped to the storable range.
///
/// Stored values never lie outside the range, so clamping keeps `<` and `>`
/// comparisons exact.
pub(crate) fn encode_bound(ts: &DateTime<Utc>) -> String {
    match ts.year() {
        year if year < FIRST_YEAR => EARLIEST.to_string(),
        year if year > LAST_YEAR => LATEST.to_string(),
        _ => ts.to_rfc3339_opts(SecondsFormat::Nanos, true),
    }
}

pub(crate) fn decode(raw: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| Error::InvalidTimestamp { value: raw.to_string(), source })
}
