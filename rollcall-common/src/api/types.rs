//! Shared API request/response types
//!
//! Every remote attendance call answers with the same envelope:
//! `{ success, data?, message? }`. Mutation payloads carry the effective
//! shift window plus whatever location the resolver produced.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Response envelope wrapping every remote attendance API payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the envelope into its payload.
    ///
    /// A `success: false` answer, with or without a payload, yields the
    /// server message (callers substitute fallback text when absent).
    pub fn into_data(self) -> Result<Option<T>, Option<String>> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self.message)
        }
    }
}

/// Payload for the clock-in mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockInRequest {
    pub shift_date: NaiveDate,
    /// Effective window start, "HH:MM"
    pub start_time: String,
    /// Effective window end, "HH:MM"
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Payload for the clock-out mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockOutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}
