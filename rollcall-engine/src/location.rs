//! Device geolocation acquisition and outlet policy fallback
//!
//! Acquisition is bounded by an explicit timeout. The fallback policy runs
//! only when acquisition fails:
//! 1. Outlet mandates GPS: propagate the failure, caller aborts, no remote
//!    call is made.
//! 2. Outlet has registered coordinates: substitute them, warn.
//! 3. Otherwise: record attendance without location, warn.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use rollcall_common::models::{Coordinates, OutletLocationPolicy};

use crate::error::{Error, Result};

/// Device geolocation collaborator seam
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Acquire the device position within the given timeout
    async fn request_position(&self, timeout: Duration) -> Result<Coordinates>;
}

/// Which branch of the fallback policy produced the location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationFallback {
    /// Device fix acquired, no fallback
    None,
    /// Device failed; outlet's registered coordinates substituted
    OutletCoordinates,
    /// Device failed and outlet has no coordinates; recorded without location
    NoLocation,
}

/// Outcome of location resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLocation {
    pub coords: Option<Coordinates>,
    pub fallback: LocationFallback,
}

impl ResolvedLocation {
    pub fn latitude(&self) -> Option<f64> {
        self.coords.map(|c| c.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coords.map(|c| c.longitude)
    }
}

/// Resolves coordinates for a clock event under an outlet's policy
pub struct LocationResolver {
    provider: Arc<dyn PositionProvider>,
    timeout: Duration,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn PositionProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Acquire the device position, applying the outlet fallback policy on
    /// failure.
    ///
    /// Providers are expected to honor the timeout themselves; the resolver
    /// enforces the bound regardless so a hung provider cannot stall the
    /// engine.
    pub async fn resolve(&self, policy: &OutletLocationPolicy) -> Result<ResolvedLocation> {
        let acquired = match tokio::time::timeout(
            self.timeout,
            self.provider.request_position(self.timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::LocationUnavailable(format!(
                "position acquisition timed out after {:?}",
                self.timeout
            ))),
        };

        match acquired {
            Ok(coords) => Ok(ResolvedLocation {
                coords: Some(coords),
                fallback: LocationFallback::None,
            }),
            Err(e) => self.fall_back(policy, e),
        }
    }

    fn fall_back(&self, policy: &OutletLocationPolicy, cause: Error) -> Result<ResolvedLocation> {
        if policy.gps_required {
            tracing::error!(error = %cause, "GPS mandated by outlet and unavailable, aborting");
            return Err(match cause {
                e @ Error::LocationUnavailable(_) => e,
                other => Error::LocationUnavailable(other.to_string()),
            });
        }

        if let Some(coords) = policy.coordinates {
            tracing::warn!(
                error = %cause,
                latitude = coords.latitude,
                longitude = coords.longitude,
                "Device position unavailable, substituting outlet coordinates"
            );
            return Ok(ResolvedLocation {
                coords: Some(coords),
                fallback: LocationFallback::OutletCoordinates,
            });
        }

        tracing::warn!(error = %cause, "Device position unavailable, recording without location");
        Ok(ResolvedLocation {
            coords: None,
            fallback: LocationFallback::NoLocation,
        })
    }
}
