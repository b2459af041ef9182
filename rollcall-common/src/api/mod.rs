//! API module for the remote attendance service wire format
//!
//! Contains only the envelope and request/response payload types; the HTTP
//! client itself lives in the engine crate. Everything here is plain serde
//! with no transport dependencies.

pub mod types;

pub use types::{ApiEnvelope, ClockInRequest, ClockOutRequest};
