//! Cached query views and the consistency protocol around mutations
//!
//! Three views are cached: today-shift, history-window, stats-window. The
//! cache is read by any consumer but mutated only here. Two rules keep it
//! sane under concurrent refreshes:
//!
//! - Last-write-wins keyed on request issuance order: every fetch takes a
//!   ticket before suspending, and a response is applied only if its ticket
//!   is at least as new as the last applied one. A slow stale response can
//!   never clobber a fresher value.
//! - Duplicate simultaneous refreshes of one view collapse into the
//!   in-flight request via a per-view refreshing flag.
//!
//! After a mutation: optimistic overwrite of the today view, invalidate all
//! three views, refetch them concurrently, and retain the previous value
//! for any refetch that fails.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::interval;
use uuid::Uuid;

use rollcall_common::config::EngineConfig;
use rollcall_common::models::{AttendanceStats, Shift};

use crate::client::AttendanceApi;
use crate::engine::SessionContext;
use crate::events::{EngineEvent, RefreshTrigger};

/// The three cached views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Today,
    History,
    Stats,
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewKind::Today => write!(f, "today-shift"),
            ViewKind::History => write!(f, "history-window"),
            ViewKind::Stats => write!(f, "stats-window"),
        }
    }
}

/// How one view's refetch settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fetched and applied (or superseded by a newer application)
    Applied,
    /// Fetch failed; previous value retained
    Failed,
    /// Another refresh of this view was already in flight
    Collapsed,
}

/// Settlement report for a three-view refresh round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub today: RefreshOutcome,
    pub history: RefreshOutcome,
    pub stats: RefreshOutcome,
}

impl RefreshReport {
    pub fn fully_applied(&self) -> bool {
        self.today == RefreshOutcome::Applied
            && self.history == RefreshOutcome::Applied
            && self.stats == RefreshOutcome::Applied
    }
}

#[derive(Debug, Clone)]
struct ViewSlot<T> {
    value: Option<T>,
    stale: bool,
    refreshing: bool,
    /// Issuance ticket of the last applied response
    last_applied_seq: u64,
    /// Ticket high-water mark at the moment of the last invalidation; only
    /// responses issued after it may clear the stale flag
    stale_marker_seq: u64,
}

impl<T> Default for ViewSlot<T> {
    fn default() -> Self {
        Self {
            value: None,
            stale: true,
            refreshing: false,
            last_applied_seq: 0,
            stale_marker_seq: 0,
        }
    }
}

/// Restorable copy of a view slot, captured before an optimistic write
#[derive(Debug, Clone)]
pub struct ViewSnapshot<T>(ViewSlot<T>);

/// One cached view with issuance-ordered application
pub struct ViewState<T> {
    kind: ViewKind,
    slot: RwLock<ViewSlot<T>>,
}

impl<T: Clone> ViewState<T> {
    fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            slot: RwLock::new(ViewSlot::default()),
        }
    }

    pub async fn value(&self) -> Option<T> {
        self.slot.read().await.value.clone()
    }

    pub async fn is_stale(&self) -> bool {
        self.slot.read().await.stale
    }

    /// Mark the view stale as of the given ticket high-water mark
    async fn invalidate(&self, marker_seq: u64) {
        let mut slot = self.slot.write().await;
        slot.stale = true;
        slot.stale_marker_seq = marker_seq;
    }

    /// Claim the refreshing flag; false means another refresh is in flight
    /// and this one should collapse into it.
    async fn try_begin(&self) -> bool {
        let mut slot = self.slot.write().await;
        if slot.refreshing {
            tracing::debug!(view = %self.kind, "Refresh collapsed into in-flight request");
            return false;
        }
        slot.refreshing = true;
        true
    }

    /// Apply a fetched value issued under `seq`
    async fn apply(&self, seq: u64, value: T) {
        let mut slot = self.slot.write().await;
        slot.refreshing = false;
        if seq < slot.last_applied_seq {
            tracing::debug!(view = %self.kind, seq, "Discarding stale response");
            return;
        }
        slot.value = Some(value);
        slot.last_applied_seq = seq;
        // A response issued before the last invalidation is still pre-mutation
        // data and leaves the view stale
        if seq > slot.stale_marker_seq {
            slot.stale = false;
        }
    }

    /// Settle a failed fetch: previous value retained, staleness kept
    async fn reject(&self, seq: u64) {
        let mut slot = self.slot.write().await;
        slot.refreshing = false;
        tracing::warn!(view = %self.kind, seq, "Refresh failed, retaining previous value");
    }

    /// Overwrite the value outside the fetch path (optimistic update),
    /// participating in issuance ordering under `seq`.
    async fn overwrite(&self, seq: u64, value: T) {
        let mut slot = self.slot.write().await;
        slot.value = Some(value);
        slot.last_applied_seq = seq;
    }

    async fn snapshot(&self) -> ViewSnapshot<T> {
        ViewSnapshot(self.slot.read().await.clone())
    }

    /// Restore a snapshot, preserving a concurrently claimed refreshing flag
    async fn restore(&self, snapshot: ViewSnapshot<T>) {
        let mut slot = self.slot.write().await;
        let refreshing = slot.refreshing;
        *slot = snapshot.0;
        slot.refreshing = refreshing;
    }
}

/// Owns the cached views and every mutation of them
pub struct CacheConsistencyManager {
    api: Arc<dyn AttendanceApi>,
    employee_id: Uuid,
    context: Arc<RwLock<Option<SessionContext>>>,
    /// Issuance-order ticket source shared by all views
    ticket: AtomicU64,
    today: ViewState<Option<Shift>>,
    history: ViewState<Vec<Shift>>,
    stats: ViewState<AttendanceStats>,
    history_window_days: i64,
    stats_window_days: i64,
    today_poll_interval: std::time::Duration,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl CacheConsistencyManager {
    pub fn new(
        api: Arc<dyn AttendanceApi>,
        employee_id: Uuid,
        context: Arc<RwLock<Option<SessionContext>>>,
        config: &EngineConfig,
        event_tx: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self {
            api,
            employee_id,
            context,
            ticket: AtomicU64::new(0),
            today: ViewState::new(ViewKind::Today),
            history: ViewState::new(ViewKind::History),
            stats: ViewState::new(ViewKind::Stats),
            history_window_days: config.history_window_days,
            stats_window_days: config.stats_window_days,
            today_poll_interval: config.today_poll_interval,
            event_tx,
        }
    }

    fn next_ticket(&self) -> u64 {
        self.ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn ticket_high_water(&self) -> u64 {
        self.ticket.load(Ordering::SeqCst)
    }

    fn emit(&self, event: EngineEvent) {
        // No receivers is OK
        let _ = self.event_tx.send(event);
    }

    /// Last-known today shift. Outer None: never loaded; inner None: the
    /// remote confirmed there is no shift today.
    pub async fn today_value(&self) -> Option<Option<Shift>> {
        self.today.value().await
    }

    pub async fn history_value(&self) -> Option<Vec<Shift>> {
        self.history.value().await
    }

    pub async fn stats_value(&self) -> Option<AttendanceStats> {
        self.stats.value().await
    }

    pub async fn today_is_stale(&self) -> bool {
        self.today.is_stale().await
    }

    async fn query_ids(&self) -> Option<(Uuid, Uuid)> {
        self.context
            .read()
            .await
            .as_ref()
            .map(|ctx| (ctx.business_id, ctx.outlet_id))
    }

    pub async fn refresh_today(&self) -> RefreshOutcome {
        let Some((business_id, outlet_id)) = self.query_ids().await else {
            tracing::debug!("No business/outlet selected, skipping today refresh");
            return RefreshOutcome::Failed;
        };
        if !self.today.try_begin().await {
            return RefreshOutcome::Collapsed;
        }
        let seq = self.next_ticket();

        match self
            .api
            .today_shift(self.employee_id, business_id, outlet_id)
            .await
        {
            Ok(shift) => {
                self.today.apply(seq, shift).await;
                self.emit(EngineEvent::ViewRefreshed {
                    view: ViewKind::Today,
                });
                RefreshOutcome::Applied
            }
            Err(e) => {
                self.today.reject(seq).await;
                self.emit(EngineEvent::PartialRefreshFailure {
                    view: ViewKind::Today,
                    message: e.to_string(),
                });
                RefreshOutcome::Failed
            }
        }
    }

    pub async fn refresh_history(&self) -> RefreshOutcome {
        if !self.history.try_begin().await {
            return RefreshOutcome::Collapsed;
        }
        let seq = self.next_ticket();

        let end_date = chrono::Utc::now().date_naive();
        let start_date = end_date - chrono::Duration::days(self.history_window_days);

        match self
            .api
            .shift_history(self.employee_id, start_date, end_date)
            .await
        {
            Ok(shifts) => {
                self.history.apply(seq, shifts).await;
                self.emit(EngineEvent::ViewRefreshed {
                    view: ViewKind::History,
                });
                RefreshOutcome::Applied
            }
            Err(e) => {
                self.history.reject(seq).await;
                self.emit(EngineEvent::PartialRefreshFailure {
                    view: ViewKind::History,
                    message: e.to_string(),
                });
                RefreshOutcome::Failed
            }
        }
    }

    pub async fn refresh_stats(&self) -> RefreshOutcome {
        if !self.stats.try_begin().await {
            return RefreshOutcome::Collapsed;
        }
        let seq = self.next_ticket();

        let end_date = chrono::Utc::now().date_naive();
        let start_date = end_date - chrono::Duration::days(self.stats_window_days);

        match self
            .api
            .attendance_stats(self.employee_id, start_date, end_date)
            .await
        {
            Ok(stats) => {
                self.stats.apply(seq, stats).await;
                self.emit(EngineEvent::ViewRefreshed {
                    view: ViewKind::Stats,
                });
                RefreshOutcome::Applied
            }
            Err(e) => {
                self.stats.reject(seq).await;
                self.emit(EngineEvent::PartialRefreshFailure {
                    view: ViewKind::Stats,
                    message: e.to_string(),
                });
                RefreshOutcome::Failed
            }
        }
    }

    /// Refetch the three views concurrently and wait for all to settle
    pub async fn refresh_all(&self) -> RefreshReport {
        let (today, history, stats) = tokio::join!(
            self.refresh_today(),
            self.refresh_history(),
            self.refresh_stats(),
        );
        RefreshReport {
            today,
            history,
            stats,
        }
    }

    /// Capture the today view for later restoration
    pub async fn snapshot_today(&self) -> ViewSnapshot<Option<Shift>> {
        self.today.snapshot().await
    }

    /// Roll the today view back to a pre-mutation snapshot
    pub async fn restore_today(&self, snapshot: ViewSnapshot<Option<Shift>>) {
        tracing::debug!("Restoring today view from pre-mutation snapshot");
        self.today.restore(snapshot).await;
    }

    /// Write a presumed-successful shift into the today view ahead of remote
    /// confirmation
    pub async fn apply_optimistic_today(&self, shift: Shift) {
        let seq = self.next_ticket();
        self.today.overwrite(seq, Some(shift)).await;
    }

    /// Merge a server-confirmed mutation result and reconcile all views:
    /// overwrite today (when affected), invalidate everything, refetch
    /// concurrently, retain previous values where refetches fail.
    pub async fn commit_mutation(&self, confirmed: Shift, affects_today: bool) -> RefreshReport {
        if affects_today {
            let seq = self.next_ticket();
            self.today.overwrite(seq, Some(confirmed)).await;
        }

        // Invalidate before refetch, per view; refetches issued after this
        // point carry tickets past the marker and may clear the flag
        let marker = self.ticket_high_water();
        self.today.invalidate(marker).await;
        self.history.invalidate(marker).await;
        self.stats.invalidate(marker).await;

        let report = self.refresh_all().await;
        if !report.fully_applied() {
            tracing::warn!(?report, "Post-mutation refresh settled with failures");
        }
        report
    }

    /// Spawn the background refresh task: today is polled on a fixed
    /// interval; focus/reconnect triggers refresh all three views.
    pub fn spawn_background(
        self: Arc<Self>,
        mut triggers: broadcast::Receiver<RefreshTrigger>,
    ) -> JoinHandle<()> {
        let manager = self;
        tokio::spawn(async move {
            let mut poll = interval(manager.today_poll_interval);
            // The first tick completes immediately; consume it so polling
            // starts one full period from now
            poll.tick().await;

            loop {
                tokio::select! {
                    _ = poll.tick() => {
                        manager.refresh_today().await;
                    }
                    trigger = triggers.recv() => {
                        match trigger {
                            Ok(trigger) => {
                                tracing::debug!(?trigger, "Refresh trigger received");
                                manager.refresh_all().await;
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                tracing::warn!(skipped, "Refresh trigger receiver lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        })
    }
}
