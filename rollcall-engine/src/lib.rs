//! # Rollcall Engine
//!
//! Attendance shift-lifecycle engine: clock-in / clock-out orchestration,
//! geolocation resolution with policy fallback, shift window validation,
//! lateness annotation, and consistency of the in-memory query cache
//! against the remote attendance service.

pub mod cache;
pub mod client;
pub mod engine;
pub mod error;
pub mod events;
pub mod location;
pub mod shift;

pub use engine::{SessionContext, ShiftLifecycleEngine, TimeSource};
pub use error::{Error, Result};
