//! Shared test helpers: in-process mock collaborators
//!
//! The remote attendance service and the device geolocation provider are
//! replaced by configurable in-memory mocks so scenarios can inject
//! failures per endpoint and count the calls that actually reach the
//! network seam.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use rollcall_common::api::{ClockInRequest, ClockOutRequest};
use rollcall_common::config::EngineConfig;
use rollcall_common::models::{
    AttendanceStats, ClockEvent, Coordinates, OutletConfig, Shift, ShiftStatus,
};
use rollcall_engine::client::AttendanceApi;
use rollcall_engine::error::{Error, Result};
use rollcall_engine::location::PositionProvider;
use rollcall_engine::SessionContext;

/// Install a test subscriber once so failing scenarios print engine traces
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub const OUTLET_COORDS: Coordinates = Coordinates {
    latitude: -6.2,
    longitude: 106.8,
};

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

pub fn test_config() -> EngineConfig {
    EngineConfig::default()
}

/// Mutable mock state, inspected and adjusted by scenarios
#[derive(Default)]
pub struct MockState {
    pub today: Option<Shift>,
    pub history: Vec<Shift>,
    pub stats: AttendanceStats,

    pub fail_today: bool,
    pub fail_history: bool,
    pub fail_stats: bool,
    pub fail_clock_in: bool,
    pub fail_clock_out: bool,

    pub today_calls: usize,
    pub history_calls: usize,
    pub stats_calls: usize,
    pub clock_in_calls: usize,
    pub clock_out_calls: usize,

    pub last_clock_in: Option<ClockInRequest>,
    pub last_clock_out: Option<ClockOutRequest>,

    /// Status the remote assigns to a freshly created shift
    pub status_on_clock_in: Option<ShiftStatus>,
    /// Artificial latency for today-shift queries
    pub today_delay: Option<Duration>,
}

pub struct MockAttendanceApi {
    pub state: Mutex<MockState>,
}

impl MockAttendanceApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState {
                status_on_clock_in: Some(ShiftStatus::Ongoing),
                ..Default::default()
            }),
        })
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

#[async_trait]
impl AttendanceApi for MockAttendanceApi {
    async fn today_shift(
        &self,
        _employee_id: Uuid,
        _business_id: Uuid,
        _outlet_id: Uuid,
    ) -> Result<Option<Shift>> {
        let (delay, result) = {
            let mut state = self.state.lock().unwrap();
            state.today_calls += 1;
            let result = if state.fail_today {
                Err(Error::Remote("today query failed".to_string()))
            } else {
                Ok(state.today.clone())
            };
            (state.today_delay, result)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn shift_history(
        &self,
        _employee_id: Uuid,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<Shift>> {
        let mut state = self.state.lock().unwrap();
        state.history_calls += 1;
        if state.fail_history {
            return Err(Error::Remote("history query failed".to_string()));
        }
        Ok(state.history.clone())
    }

    async fn attendance_stats(
        &self,
        _employee_id: Uuid,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<AttendanceStats> {
        let mut state = self.state.lock().unwrap();
        state.stats_calls += 1;
        if state.fail_stats {
            return Err(Error::Remote("stats query failed".to_string()));
        }
        Ok(state.stats.clone())
    }

    async fn clock_in(
        &self,
        employee_id: Uuid,
        business_id: Uuid,
        outlet_id: Uuid,
        request: ClockInRequest,
    ) -> Result<Shift> {
        let mut state = self.state.lock().unwrap();
        state.clock_in_calls += 1;
        state.last_clock_in = Some(request.clone());
        if state.fail_clock_in {
            return Err(Error::Remote("shift rejected by server".to_string()));
        }

        let shift = Shift {
            id: Uuid::new_v4(),
            employee_id,
            outlet_id,
            business_id,
            shift_date: request.shift_date,
            scheduled_start: request.start_time,
            scheduled_end: request.end_time,
            clock_in: Some(ClockEvent {
                timestamp: Utc::now(),
                latitude: request.latitude,
                longitude: request.longitude,
            }),
            clock_out: None,
            status: state.status_on_clock_in,
        };
        state.today = Some(shift.clone());
        Ok(shift)
    }

    async fn clock_out(&self, shift_id: Uuid, request: ClockOutRequest) -> Result<Shift> {
        let mut state = self.state.lock().unwrap();
        state.clock_out_calls += 1;
        state.last_clock_out = Some(request.clone());
        if state.fail_clock_out {
            return Err(Error::Remote("clock-out rejected by server".to_string()));
        }

        let close = |shift: &mut Shift| {
            shift.clock_out = Some(ClockEvent {
                timestamp: Utc::now(),
                latitude: request.latitude,
                longitude: request.longitude,
            });
            shift.status = Some(ShiftStatus::Completed);
        };

        let mut confirmed = None;
        if let Some(today) = state.today.as_mut() {
            if today.id == shift_id {
                close(today);
                confirmed = Some(today.clone());
            }
        }
        for shift in state.history.iter_mut() {
            if shift.id == shift_id {
                close(shift);
                confirmed.get_or_insert_with(|| shift.clone());
            }
        }

        confirmed.ok_or_else(|| Error::Remote("unknown shift".to_string()))
    }
}

/// Geolocation mock behaviors
pub enum MockPosition {
    Fix(Coordinates),
    Deny,
    Hang,
}

pub struct MockPositionProvider(pub MockPosition);

impl MockPositionProvider {
    pub fn fix(coords: Coordinates) -> Arc<Self> {
        Arc::new(Self(MockPosition::Fix(coords)))
    }

    pub fn deny() -> Arc<Self> {
        Arc::new(Self(MockPosition::Deny))
    }
}

#[async_trait]
impl PositionProvider for MockPositionProvider {
    async fn request_position(&self, _timeout: Duration) -> Result<Coordinates> {
        match &self.0 {
            MockPosition::Fix(coords) => Ok(*coords),
            MockPosition::Deny => Err(Error::LocationUnavailable(
                "permission denied".to_string(),
            )),
            MockPosition::Hang => std::future::pending().await,
        }
    }
}

/// Context for an outlet with the given GPS policy
pub fn context(gps_required: bool, outlet_coords: Option<Coordinates>) -> SessionContext {
    SessionContext {
        business_id: Uuid::new_v4(),
        outlet_id: Uuid::new_v4(),
        outlet: OutletConfig {
            attendance_gps_required: gps_required,
            latitude: outlet_coords.map(|c| c.latitude),
            longitude: outlet_coords.map(|c| c.longitude),
            ..Default::default()
        },
    }
}

/// An ongoing shift clocked in `clock_in_offset_minutes` after scheduled
/// start on `date`
pub fn ongoing_shift(date: NaiveDate, start: &str, clock_in_offset_minutes: i64) -> Shift {
    let start_minutes = rollcall_common::time::parse_day_minutes(start).unwrap();
    let clock_in_at = rollcall_engine::shift::schedule_instant(
        date,
        start_minutes + clock_in_offset_minutes,
    );
    Shift {
        id: Uuid::new_v4(),
        employee_id: Uuid::new_v4(),
        outlet_id: Uuid::new_v4(),
        business_id: Uuid::new_v4(),
        shift_date: date,
        scheduled_start: start.to_string(),
        scheduled_end: "17:00".to_string(),
        clock_in: Some(ClockEvent {
            timestamp: clock_in_at,
            latitude: None,
            longitude: None,
        }),
        clock_out: None,
        status: Some(ShiftStatus::Ongoing),
    }
}
