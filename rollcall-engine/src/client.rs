//! Remote attendance API client
//!
//! The remote service is an opaque collaborator with its own retry/backoff
//! policy; this client only shapes requests, triages HTTP status, and
//! unwraps the `{success, data, message}` envelope.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use uuid::Uuid;

use rollcall_common::api::{ApiEnvelope, ClockInRequest, ClockOutRequest};
use rollcall_common::models::{AttendanceStats, Shift};

use crate::error::{Error, Result, REMOTE_FALLBACK_MESSAGE};

const USER_AGENT: &str = "rollcall/0.1.0";

/// Remote attendance service seam
///
/// The engine and cache manager only ever talk to this trait; the HTTP
/// implementation below is swapped for an in-process mock in tests.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    /// Fetch the employee's shift for today, if any
    async fn today_shift(
        &self,
        employee_id: Uuid,
        business_id: Uuid,
        outlet_id: Uuid,
    ) -> Result<Option<Shift>>;

    /// Fetch shifts in a closed date window
    async fn shift_history(
        &self,
        employee_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>>;

    /// Fetch aggregated attendance counters for a date window
    async fn attendance_stats(
        &self,
        employee_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<AttendanceStats>;

    /// Create a shift by clocking in
    async fn clock_in(
        &self,
        employee_id: Uuid,
        business_id: Uuid,
        outlet_id: Uuid,
        request: ClockInRequest,
    ) -> Result<Shift>;

    /// Close a shift by clocking out
    async fn clock_out(&self, shift_id: Uuid, request: ClockOutRequest) -> Result<Shift>;
}

/// HTTP implementation of the attendance API
pub struct HttpAttendanceClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpAttendanceClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Unwrap a response into its envelope payload.
    ///
    /// HTTP-level failures map to `Http`; an unsuccessful envelope maps to
    /// `Remote` with the server message passed through verbatim.
    async fn read_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Http(format!("{}: {}", status.as_u16(), error_text)));
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        envelope
            .into_data()
            .map_err(|message| Error::Remote(message.unwrap_or_else(|| {
                REMOTE_FALLBACK_MESSAGE.to_string()
            })))
    }

    /// As `read_envelope`, but a missing payload on success is itself an error
    /// (mutations always answer with the affected shift).
    async fn read_required<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        Self::read_envelope(response)
            .await?
            .ok_or_else(|| Error::Parse("response envelope missing data".to_string()))
    }
}

#[async_trait]
impl AttendanceApi for HttpAttendanceClient {
    async fn today_shift(
        &self,
        employee_id: Uuid,
        business_id: Uuid,
        outlet_id: Uuid,
    ) -> Result<Option<Shift>> {
        let url = format!("{}/attendance/today", self.base_url);

        tracing::debug!(%employee_id, %outlet_id, "Querying today shift");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("employee_id", employee_id.to_string()),
                ("business_id", business_id.to_string()),
                ("outlet_id", outlet_id.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Self::read_envelope(response).await
    }

    async fn shift_history(
        &self,
        employee_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Shift>> {
        let url = format!("{}/attendance/history", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("employee_id", employee_id.to_string()),
                ("start_date", start_date.to_string()),
                ("end_date", end_date.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self::read_envelope(response).await?.unwrap_or_default())
    }

    async fn attendance_stats(
        &self,
        employee_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<AttendanceStats> {
        let url = format!("{}/attendance/stats", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("employee_id", employee_id.to_string()),
                ("start_date", start_date.to_string()),
                ("end_date", end_date.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Self::read_required(response).await
    }

    async fn clock_in(
        &self,
        employee_id: Uuid,
        business_id: Uuid,
        outlet_id: Uuid,
        request: ClockInRequest,
    ) -> Result<Shift> {
        let url = format!("{}/attendance/clock-in", self.base_url);

        tracing::info!(
            %employee_id,
            %outlet_id,
            shift_date = %request.shift_date,
            start = %request.start_time,
            end = %request.end_time,
            "Submitting clock-in"
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[
                ("employee_id", employee_id.to_string()),
                ("business_id", business_id.to_string()),
                ("outlet_id", outlet_id.to_string()),
            ])
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Self::read_required(response).await
    }

    async fn clock_out(&self, shift_id: Uuid, request: ClockOutRequest) -> Result<Shift> {
        let url = format!("{}/attendance/{}/clock-out", self.base_url, shift_id);

        tracing::info!(%shift_id, "Submitting clock-out");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Self::read_required(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client =
            HttpAttendanceClient::new("http://localhost:8080", Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[test]
    fn test_fallback_message_on_empty_remote_rejection() {
        // Exercised through the envelope helper shape: a success=false
        // envelope with no message must surface the fixed fallback text.
        let envelope: ApiEnvelope<Shift> = ApiEnvelope {
            success: false,
            data: None,
            message: None,
        };
        let err = envelope
            .into_data()
            .map_err(|m| Error::Remote(m.unwrap_or_else(|| REMOTE_FALLBACK_MESSAGE.to_string())))
            .unwrap_err();
        assert!(err.to_string().contains(REMOTE_FALLBACK_MESSAGE));
    }
}
