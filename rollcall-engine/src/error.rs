//! Error types for the rollcall engine
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Validation and precondition errors are resolved entirely
//! locally and never reach the remote layer.

use thiserror::Error;

/// Fallback text surfaced when the remote rejects a request without a message
pub const REMOTE_FALLBACK_MESSAGE: &str = "Request failed, please try again";

/// Main error type for the rollcall engine
#[derive(Error, Debug)]
pub enum Error {
    /// Custom start/end cannot form a positive-duration window
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    /// Business or outlet not selected before a clock operation
    #[error("Missing context: {0}")]
    MissingContext(String),

    /// Geolocation acquisition failed and the outlet mandates GPS
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// Duplicate concurrent submission of an operation kind already running
    #[error("Operation already in flight: {0}")]
    OperationInFlight(String),

    /// Shift is not in a state that permits the requested transition
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Remote mutation or query failed after the transport's retries
    #[error("Remote failure: {0}")]
    Remote(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body did not deserialize
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors bubbled up from the common crate (time parsing etc.)
    #[error(transparent)]
    Common(#[from] rollcall_common::Error),
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
