//! Attendance data models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geographic coordinates attached to a clock event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One recorded clock-in or clock-out event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockEvent {
    /// Moment the event was recorded
    pub timestamp: DateTime<Utc>,
    /// Recorded latitude (None when attendance was taken without location)
    pub latitude: Option<f64>,
    /// Recorded longitude (None when attendance was taken without location)
    pub longitude: Option<f64>,
}

/// Remote-assigned shift status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Scheduled,
    Ongoing,
    Late,
    Completed,
    Absent,
}

/// One scheduled+actual work period for an employee at an outlet on a date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub outlet_id: Uuid,
    pub business_id: Uuid,
    pub shift_date: NaiveDate,
    /// Scheduled window start, wire format "HH:MM"
    pub scheduled_start: String,
    /// Scheduled window end, "HH:MM"; end <= start in day-minutes means the
    /// window crosses midnight
    pub scheduled_end: String,
    pub clock_in: Option<ClockEvent>,
    pub clock_out: Option<ClockEvent>,
    /// Status as assigned by the remote system (may be absent on older rows)
    pub status: Option<ShiftStatus>,
}

impl Shift {
    /// A shift is open when it has been started but not yet closed
    pub fn is_ongoing(&self) -> bool {
        self.clock_in.is_some() && self.clock_out.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.clock_in.is_some() && self.clock_out.is_some()
    }
}

/// Aggregated attendance counters for a date window
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total_shifts: i64,
    pub completed: i64,
    pub late: i64,
    pub present: i64,
    pub absent: i64,
}

/// Outlet record fields consumed by the engine (read-only)
///
/// Field names follow the upstream outlet schema; shift preset times may
/// arrive as "HH:MM" or "HH:MM:SS".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutletConfig {
    pub shift_pagi_start: Option<String>,
    pub shift_pagi_end: Option<String>,
    pub shift_siang_start: Option<String>,
    pub shift_siang_end: Option<String>,
    pub shift_malam_start: Option<String>,
    pub shift_malam_end: Option<String>,
    #[serde(default)]
    pub attendance_gps_required: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl OutletConfig {
    /// Extract the location policy this outlet imposes on clock events
    pub fn location_policy(&self) -> OutletLocationPolicy {
        OutletLocationPolicy {
            gps_required: self.attendance_gps_required,
            coordinates: match (self.latitude, self.longitude) {
                (Some(latitude), Some(longitude)) => Some(Coordinates {
                    latitude,
                    longitude,
                }),
                _ => None,
            },
        }
    }
}

/// Geolocation policy an outlet imposes on attendance recording
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutletLocationPolicy {
    /// When true, attendance without a device fix is refused outright
    pub gps_required: bool,
    /// Registered outlet coordinates, used as fallback when the device
    /// cannot produce a fix
    pub coordinates: Option<Coordinates>,
}
