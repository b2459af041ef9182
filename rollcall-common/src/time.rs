//! Day-minute time utilities
//!
//! Shift times travel the wire as `"HH:MM"` (outlet presets sometimes as
//! `"HH:MM:SS"`). All window arithmetic happens in minutes since midnight,
//! so an overnight span is representable as `end + MINUTES_PER_DAY`.

use crate::{Error, Result};

/// Minutes in one civil day
pub const MINUTES_PER_DAY: i64 = 1440;

/// Parse `"HH:MM"` or `"HH:MM:SS"` into minutes since midnight.
///
/// Seconds, when present, are truncated. Hours must be 0-23 and minutes 0-59.
pub fn parse_day_minutes(text: &str) -> Result<i64> {
    let mut parts = text.split(':');

    let hours: i64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| Error::InvalidTimeOfDay(text.to_string()))?;
    let minutes: i64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(|| Error::InvalidTimeOfDay(text.to_string()))?;

    // Optional seconds field is validated but discarded
    if let Some(secs) = parts.next() {
        let secs: i64 = secs
            .parse()
            .map_err(|_| Error::InvalidTimeOfDay(text.to_string()))?;
        if !(0..60).contains(&secs) {
            return Err(Error::InvalidTimeOfDay(text.to_string()));
        }
    }
    if parts.next().is_some() {
        return Err(Error::InvalidTimeOfDay(text.to_string()));
    }

    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(Error::InvalidTimeOfDay(text.to_string()));
    }

    Ok(hours * 60 + minutes)
}

/// Format minutes since midnight as `"HH:MM"`.
///
/// Values past midnight (overnight-adjusted) wrap back into 00:00-23:59.
pub fn format_day_minutes(minutes: i64) -> String {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

/// Truncate `"HH:MM:SS"` to `"HH:MM"`, leaving `"HH:MM"` untouched.
///
/// Returns None when the input does not parse as a time of day at all.
pub fn truncate_to_hh_mm(text: &str) -> Option<String> {
    parse_day_minutes(text).ok().map(format_day_minutes)
}
