//! Shift lifecycle orchestration
//!
//! Owns the `NoShift -> Ongoing -> Completed` state machine. Clock-in and
//! clock-out resolve the effective time window and location, issue the
//! remote mutation, and hand the result to the cache manager. Late/on-time
//! is an annotation on top of the lifecycle, never a state of it.
//!
//! Every operation kind carries an in-flight token created before the first
//! suspension point and released by drop on every exit path; for clock-out
//! the token is held until the post-mutation refresh settles, so a busy
//! indicator driven by it reflects true completion.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use rollcall_common::api::{ClockInRequest, ClockOutRequest};
use rollcall_common::config::EngineConfig;
use rollcall_common::models::{
    AttendanceStats, ClockEvent, OutletConfig, Shift, ShiftStatus,
};
use rollcall_common::time::parse_day_minutes;

use crate::cache::{CacheConsistencyManager, RefreshReport};
use crate::client::AttendanceApi;
use crate::error::{Error, Result};
use crate::events::{EngineEvent, RefreshTrigger};
use crate::location::{LocationFallback, LocationResolver, PositionProvider};
use crate::shift::{
    format_lateness, minutes_late, schedule_instant, PresetKind, ShiftPresets, ShiftWindow,
};

/// Selected business/outlet pair plus the outlet's configuration
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub business_id: Uuid,
    pub outlet_id: Uuid,
    pub outlet: OutletConfig,
}

/// How the caller chose the shift window for clock-in
#[derive(Debug, Clone)]
pub enum TimeSource {
    Preset(PresetKind),
    Custom { start: String, end: String },
}

/// A shift enriched with the display annotations derived on read
#[derive(Debug, Clone)]
pub struct AnnotatedShift {
    pub shift: Shift,
    pub status: ShiftStatus,
    pub minutes_late: Option<i64>,
    pub on_time: bool,
    pub lateness_display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum OpKind {
    ClockIn,
    ClockOut,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::ClockIn => write!(f, "clock-in"),
            OpKind::ClockOut => write!(f, "clock-out"),
        }
    }
}

/// In-flight operation tokens, one per operation kind
struct InFlightOps(Mutex<HashSet<OpKind>>);

impl InFlightOps {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(HashSet::new())))
    }

    /// Claim a token; a second concurrent claim of the same kind is refused
    fn acquire(ops: &Arc<Self>, kind: OpKind) -> Result<OpToken> {
        let mut held = ops.0.lock().unwrap();
        if !held.insert(kind) {
            return Err(Error::OperationInFlight(kind.to_string()));
        }
        Ok(OpToken {
            ops: Arc::clone(ops),
            kind,
        })
    }

    fn holds(&self, kind: OpKind) -> bool {
        self.0.lock().unwrap().contains(&kind)
    }
}

/// Released on drop, exactly once, on success and failure paths alike
struct OpToken {
    ops: Arc<InFlightOps>,
    kind: OpKind,
}

impl Drop for OpToken {
    fn drop(&mut self) {
        if let Ok(mut ops) = self.ops.0.lock() {
            ops.remove(&self.kind);
        }
    }
}

/// Derive lifecycle status from the clock events alone.
///
/// This is the only client-side derivation; a remote-assigned status always
/// takes precedence over it (see `ShiftLifecycleEngine::annotate`).
pub fn derive_status(
    clock_in: Option<&ClockEvent>,
    clock_out: Option<&ClockEvent>,
    scheduled_start: Option<DateTime<Utc>>,
    tolerance_minutes: i64,
) -> ShiftStatus {
    match (clock_in, clock_out) {
        (None, _) => ShiftStatus::Scheduled,
        (Some(_), Some(_)) => ShiftStatus::Completed,
        (Some(event), None) => {
            let late = minutes_late(
                scheduled_start,
                Some(event.timestamp),
                tolerance_minutes,
            );
            if late.map_or(false, |m| m > 0) {
                ShiftStatus::Late
            } else {
                ShiftStatus::Ongoing
            }
        }
    }
}

/// Orchestrates clock-in / clock-out against the remote service and keeps
/// the cached views consistent
pub struct ShiftLifecycleEngine {
    api: Arc<dyn AttendanceApi>,
    location: LocationResolver,
    cache: Arc<CacheConsistencyManager>,
    employee_id: Uuid,
    tolerance_minutes: i64,
    context: Arc<RwLock<Option<SessionContext>>>,
    in_flight: Arc<InFlightOps>,
    event_tx: broadcast::Sender<EngineEvent>,
    trigger_tx: broadcast::Sender<RefreshTrigger>,
}

impl ShiftLifecycleEngine {
    pub fn new(
        api: Arc<dyn AttendanceApi>,
        position_provider: Arc<dyn PositionProvider>,
        config: EngineConfig,
        employee_id: Uuid,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (trigger_tx, _) = broadcast::channel(16);
        let context = Arc::new(RwLock::new(None));

        let cache = Arc::new(CacheConsistencyManager::new(
            Arc::clone(&api),
            employee_id,
            Arc::clone(&context),
            &config,
            event_tx.clone(),
        ));

        Self {
            api,
            location: LocationResolver::new(position_provider, config.location_timeout),
            cache,
            employee_id,
            tolerance_minutes: config.tolerance_minutes,
            context,
            in_flight: InFlightOps::new(),
            event_tx,
            trigger_tx,
        }
    }

    /// Select the business/outlet this session operates under
    pub async fn select_context(&self, context: SessionContext) {
        *self.context.write().await = Some(context);
    }

    /// Subscribe to engine events (fallback warnings, refresh outcomes)
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Host window regained focus: refresh all views
    pub fn notify_focus(&self) {
        let _ = self.trigger_tx.send(RefreshTrigger::Focus);
    }

    /// Network connectivity returned: refresh all views
    pub fn notify_reconnect(&self) {
        let _ = self.trigger_tx.send(RefreshTrigger::Reconnect);
    }

    /// Start background polling and trigger handling
    pub fn start_background_refresh(&self) -> JoinHandle<()> {
        Arc::clone(&self.cache).spawn_background(self.trigger_tx.subscribe())
    }

    /// Direct access to the cached views
    pub fn cache(&self) -> Arc<CacheConsistencyManager> {
        Arc::clone(&self.cache)
    }

    pub fn is_clocking_in(&self) -> bool {
        self.in_flight.holds(OpKind::ClockIn)
    }

    pub fn is_clocking_out(&self) -> bool {
        self.in_flight.holds(OpKind::ClockOut)
    }

    /// Presets for the currently selected outlet (defaults when none)
    pub async fn presets(&self) -> ShiftPresets {
        let context = self.context.read().await;
        ShiftPresets::resolve(context.as_ref().map(|c| &c.outlet))
    }

    /// Manually refresh all three views
    pub async fn refresh(&self) -> RefreshReport {
        self.cache.refresh_all().await
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn require_context(&self) -> Result<SessionContext> {
        self.context.read().await.clone().ok_or_else(|| {
            Error::MissingContext(
                "business and outlet must be selected before clock operations".to_string(),
            )
        })
    }

    /// Annotate a shift for display.
    ///
    /// The remote-assigned status is authoritative when present; the local
    /// derivation only fills the gap. The lateness duration is always
    /// computed client-side.
    pub fn annotate(&self, shift: &Shift) -> AnnotatedShift {
        let scheduled_start = parse_day_minutes(&shift.scheduled_start)
            .ok()
            .map(|minutes| schedule_instant(shift.shift_date, minutes));
        let clock_in_at = shift.clock_in.as_ref().map(|event| event.timestamp);

        let minutes = minutes_late(scheduled_start, clock_in_at, self.tolerance_minutes);
        let status = shift.status.unwrap_or_else(|| {
            derive_status(
                shift.clock_in.as_ref(),
                shift.clock_out.as_ref(),
                scheduled_start,
                self.tolerance_minutes,
            )
        });

        let on_time = status != ShiftStatus::Late;
        let lateness_display = if on_time {
            "on time".to_string()
        } else {
            format_lateness(minutes.unwrap_or(0))
        };

        AnnotatedShift {
            shift: shift.clone(),
            status,
            minutes_late: minutes,
            on_time,
            lateness_display,
        }
    }

    /// Annotated today shift, if the view is loaded and a shift exists
    pub async fn today_view(&self) -> Option<AnnotatedShift> {
        self.cache
            .today_value()
            .await
            .flatten()
            .map(|shift| self.annotate(&shift))
    }

    /// Annotated history window (empty when not yet loaded)
    pub async fn history_view(&self) -> Vec<AnnotatedShift> {
        self.cache
            .history_value()
            .await
            .unwrap_or_default()
            .iter()
            .map(|shift| self.annotate(shift))
            .collect()
    }

    pub async fn stats_view(&self) -> Option<AttendanceStats> {
        self.cache.stats_value().await
    }

    /// Open a shift for `shift_date`.
    ///
    /// Preconditions are resolved entirely locally: selected context, no
    /// cached ongoing shift for the date, a valid time window, and a
    /// location resolvable under the outlet policy. None of their failures
    /// issues a network request.
    pub async fn clock_in(
        &self,
        shift_date: NaiveDate,
        source: TimeSource,
    ) -> Result<AnnotatedShift> {
        let _token = InFlightOps::acquire(&self.in_flight, OpKind::ClockIn)?;
        let context = self.require_context().await?;

        if let Some(Some(cached)) = self.cache.today_value().await {
            if cached.is_ongoing() && cached.shift_date == shift_date {
                return Err(Error::InvalidState(
                    "a shift is already ongoing for this date".to_string(),
                ));
            }
        }

        let window = match &source {
            TimeSource::Preset(kind) => {
                let presets = ShiftPresets::resolve(Some(&context.outlet));
                let preset = presets.get(*kind);
                ShiftWindow::validate(&preset.start, &preset.end)?
            }
            TimeSource::Custom { start, end } => ShiftWindow::validate(start, end)?,
        };

        let resolved = self
            .location
            .resolve(&context.outlet.location_policy())
            .await?;
        if resolved.fallback != LocationFallback::None {
            self.emit(EngineEvent::LocationFallback {
                fallback: resolved.fallback,
            });
        }

        let request = ClockInRequest {
            shift_date,
            start_time: window.start_text(),
            end_time: window.end_text(),
            latitude: resolved.latitude(),
            longitude: resolved.longitude(),
        };

        tracing::info!(
            %shift_date,
            start = %request.start_time,
            end = %request.end_time,
            overnight = window.is_overnight(),
            "Clocking in"
        );

        let snapshot = self.cache.snapshot_today().await;
        match self
            .api
            .clock_in(
                self.employee_id,
                context.business_id,
                context.outlet_id,
                request,
            )
            .await
        {
            Ok(shift) => {
                self.cache.commit_mutation(shift.clone(), true).await;
                Ok(self.annotate(&shift))
            }
            Err(e) => {
                self.cache.restore_today(snapshot).await;
                Err(e)
            }
        }
    }

    /// Close the cached today shift
    pub async fn clock_out(&self, shift_id: Uuid) -> Result<AnnotatedShift> {
        let token = InFlightOps::acquire(&self.in_flight, OpKind::ClockOut)?;

        let target = self
            .cache
            .today_value()
            .await
            .flatten()
            .filter(|shift| shift.id == shift_id)
            .ok_or_else(|| {
                Error::InvalidState("shift is not the cached today shift".to_string())
            })?;

        self.clock_out_guarded(token, target, true).await
    }

    /// Close a shift from the cached history window.
    ///
    /// The target need not be the today shift; the today view is only
    /// touched when the two are the same record.
    pub async fn clock_out_from_history(&self, shift_id: Uuid) -> Result<AnnotatedShift> {
        let token = InFlightOps::acquire(&self.in_flight, OpKind::ClockOut)?;

        let target = self
            .cache
            .history_value()
            .await
            .and_then(|shifts| shifts.into_iter().find(|shift| shift.id == shift_id))
            .ok_or_else(|| {
                Error::InvalidState("shift not found in cached history".to_string())
            })?;

        let affects_today = self
            .cache
            .today_value()
            .await
            .flatten()
            .map_or(false, |today| today.id == shift_id);

        self.clock_out_guarded(token, target, affects_today).await
    }

    /// Shared clock-out path. `_token` is held until the post-mutation
    /// refresh settles.
    async fn clock_out_guarded(
        &self,
        _token: OpToken,
        target: Shift,
        affects_today: bool,
    ) -> Result<AnnotatedShift> {
        if target.clock_in.is_none() {
            return Err(Error::InvalidState(
                "cannot clock out of a shift that was never started".to_string(),
            ));
        }
        if target.clock_out.is_some() {
            return Err(Error::InvalidState(
                "shift is already completed".to_string(),
            ));
        }

        let context = self.require_context().await?;

        let resolved = self
            .location
            .resolve(&context.outlet.location_policy())
            .await?;
        if resolved.fallback != LocationFallback::None {
            self.emit(EngineEvent::LocationFallback {
                fallback: resolved.fallback,
            });
        }

        tracing::info!(shift_id = %target.id, affects_today, "Clocking out");

        let snapshot = self.cache.snapshot_today().await;
        if affects_today {
            let mut optimistic = target.clone();
            optimistic.clock_out = Some(ClockEvent {
                timestamp: Utc::now(),
                latitude: resolved.latitude(),
                longitude: resolved.longitude(),
            });
            self.cache.apply_optimistic_today(optimistic).await;
        }

        let request = ClockOutRequest {
            latitude: resolved.latitude(),
            longitude: resolved.longitude(),
        };

        match self.api.clock_out(target.id, request).await {
            Ok(confirmed) => {
                self.cache.commit_mutation(confirmed.clone(), affects_today).await;
                Ok(self.annotate(&confirmed))
            }
            Err(e) => {
                if affects_today {
                    self.cache.restore_today(snapshot).await;
                }
                Err(e)
            }
        }
    }
}
