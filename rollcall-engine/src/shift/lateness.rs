//! Lateness arithmetic and display formatting
//!
//! Lateness accrues only past the tolerance window: a clock-in at
//! scheduled start + tolerance is still on time, one millisecond later
//! starts the count. Whole minutes only, floor division.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// Minutes late relative to scheduled start plus tolerance.
///
/// Returns None when either input is missing, 0 when the clock-in falls
/// within the tolerance window.
pub fn minutes_late(
    scheduled_start: Option<DateTime<Utc>>,
    clock_in: Option<DateTime<Utc>>,
    tolerance_minutes: i64,
) -> Option<i64> {
    let scheduled_start = scheduled_start?;
    let clock_in = clock_in?;

    let allowed = scheduled_start + Duration::minutes(tolerance_minutes);
    if clock_in <= allowed {
        return Some(0);
    }

    Some((clock_in - allowed).num_milliseconds() / 60_000)
}

/// Materialize a day-minutes schedule time on a concrete date.
///
/// Day-minutes past 1440 (overnight-adjusted window ends) land on the
/// following day.
pub fn schedule_instant(date: NaiveDate, day_minutes: i64) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).expect("midnight always exists");
    Utc.from_utc_datetime(&midnight) + Duration::minutes(day_minutes)
}

/// Format a lateness duration for display.
///
/// 0 → "on time"; under an hour → "N minutes"; otherwise hours and the
/// minute remainder.
pub fn format_lateness(minutes: i64) -> String {
    if minutes <= 0 {
        return "on time".to_string();
    }
    if minutes < 60 {
        return format!("{} minutes", minutes);
    }
    format!("{} hours {} minutes", minutes / 60, minutes % 60)
}
