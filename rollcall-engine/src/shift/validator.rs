//! Shift window validation
//!
//! A window whose end is at or before its start (in day-minutes) crosses
//! midnight; the effective end is pushed forward one day.

use rollcall_common::time::{format_day_minutes, parse_day_minutes, MINUTES_PER_DAY};

use crate::error::{Error, Result};

/// A validated shift window in minutes since midnight of the shift date
///
/// `end` may exceed 1440 for overnight windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: i64,
    pub end: i64,
    pub duration_minutes: i64,
}

impl ShiftWindow {
    /// Validate a start/end pair, resolving overnight wraparound.
    pub fn validate(start: &str, end: &str) -> Result<Self> {
        let start_minutes = parse_day_minutes(start)
            .map_err(|_| Error::InvalidTimeRange(format!("unparseable start time: {start}")))?;
        let mut end_minutes = parse_day_minutes(end)
            .map_err(|_| Error::InvalidTimeRange(format!("unparseable end time: {end}")))?;

        // end <= start means the window crosses midnight
        if end_minutes <= start_minutes {
            end_minutes += MINUTES_PER_DAY;
        }

        let duration_minutes = end_minutes - start_minutes;
        if duration_minutes <= 0 {
            return Err(Error::InvalidTimeRange(format!(
                "window {start}-{end} has non-positive duration"
            )));
        }

        Ok(Self {
            start: start_minutes,
            end: end_minutes,
            duration_minutes,
        })
    }

    /// Whether the window crosses midnight
    pub fn is_overnight(&self) -> bool {
        self.end >= MINUTES_PER_DAY
    }

    /// Window start as wire text, "HH:MM"
    pub fn start_text(&self) -> String {
        format_day_minutes(self.start)
    }

    /// Window end as wire text, "HH:MM" (wrapped back into the day)
    pub fn end_text(&self) -> String {
        format_day_minutes(self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_daytime_window() {
        let window = ShiftWindow::validate("08:00", "17:00").unwrap();
        assert_eq!(window.start, 480);
        assert_eq!(window.end, 1020);
        assert_eq!(window.duration_minutes, 540);
        assert!(!window.is_overnight());
    }

    #[test]
    fn test_overnight_window_wraps_end() {
        // 23:00 to 01:00 next day, two hours
        let window = ShiftWindow::validate("23:00", "01:00").unwrap();
        assert_eq!(window.start, 1380);
        assert_eq!(window.end, 1440 + 60);
        assert_eq!(window.duration_minutes, 120);
        assert!(window.is_overnight());
        assert_eq!(window.end_text(), "01:00");
    }

    #[test]
    fn test_equal_start_end_is_full_day() {
        // end == start is treated as overnight: a full 24h window
        let window = ShiftWindow::validate("08:00", "08:00").unwrap();
        assert_eq!(window.duration_minutes, 1440);
        assert!(window.is_overnight());
    }

    #[test]
    fn test_night_preset_span() {
        let window = ShiftWindow::validate("20:00", "05:00").unwrap();
        assert_eq!(window.duration_minutes, 540);
        assert!(window.is_overnight());
    }

    #[test]
    fn test_rejects_unparseable_input() {
        assert!(matches!(
            ShiftWindow::validate("soon", "17:00"),
            Err(Error::InvalidTimeRange(_))
        ));
        assert!(matches!(
            ShiftWindow::validate("08:00", "25:00"),
            Err(Error::InvalidTimeRange(_))
        ));
    }

    #[test]
    fn test_wire_text_round_trip() {
        let window = ShiftWindow::validate("08:30", "17:15").unwrap();
        assert_eq!(window.start_text(), "08:30");
        assert_eq!(window.end_text(), "17:15");
    }
}
