//! Engine event types
//!
//! Non-fatal notifications broadcast to observers (hosts, test harnesses).
//! Send errors are ignored; having no receivers is normal.

use crate::cache::ViewKind;
use crate::location::LocationFallback;

/// Events emitted by the engine and cache manager
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Geolocation failed and a fallback branch was taken
    LocationFallback { fallback: LocationFallback },

    /// One of the post-mutation or background refetches failed; the
    /// previous cached value was retained
    PartialRefreshFailure { view: ViewKind, message: String },

    /// A view refetch completed and was applied to the cache
    ViewRefreshed { view: ViewKind },
}

/// External refresh triggers fed to the background refresh task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Host window regained focus
    Focus,
    /// Network connectivity returned
    Reconnect,
}
