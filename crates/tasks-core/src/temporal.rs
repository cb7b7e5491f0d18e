//! Timestamp parsing for extracted date/time entities.
//!
//! Inference services return ISO-8601-like strings with varying precision:
//! full RFC 3339 with offset (`2016-10-19T17:00:00.000-07:00`), UTC with a
//! `Z` suffix, offset-less local times, and bare dates for day-grained
//! values. All of them normalize to `DateTime<Utc>`; values without an
//! offset are taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Error, Result};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse an extracted timestamp value.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Parse("empty timestamp".to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(Error::Parse(format!("not a timestamp: {:?}", value)))
}
