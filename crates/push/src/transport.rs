//! Push delivery through an FCM-style HTTP gateway.
//!
//! [`FcmTransport`] sends one JSON batch per dispatch: every eligible device
//! token travels in a single `registration_ids` request and the gateway
//! answers with aggregate `success`/`failure` counts. The transport never
//! retries; the cycle cadence is the retry policy.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default FCM legacy HTTP endpoint.
const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

/// HTTP request timeout for a single batch send.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for push gateway failures.
///
/// A partial failure is not an error: the gateway answered and the counts
/// travel in [`BatchOutcome`]. An error here means no counts came back at
/// all.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Push gateway returned HTTP {0}")]
    HttpStatus(u16),

    /// The gateway answered 2xx with a body that could not be interpreted.
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),
}

// ---------------------------------------------------------------------------
// Batch outcome
// ---------------------------------------------------------------------------

/// Aggregate result of one batch send.
///
/// The gateway reports counts without device identity, so callers can fold
/// the numbers into totals but cannot attribute individual failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Devices the gateway accepted the message for.
    pub success: i64,
    /// Devices the gateway rejected.
    pub failure: i64,
    /// Gateway error strings for the rejected devices, for logging only.
    pub failure_details: Vec<String>,
}

// ---------------------------------------------------------------------------
// PushTransport
// ---------------------------------------------------------------------------

/// Gateway seam used by the dispatcher: one call per dispatch batch.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Send one message to every device token in the batch.
    ///
    /// Implementations must not retry internally and must report partial
    /// failure through the returned counts, not through `Err`.
    async fn send_batch(
        &self,
        device_tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<BatchOutcome, TransportError>;
}

// ---------------------------------------------------------------------------
// FcmConfig
// ---------------------------------------------------------------------------

/// Configuration for the FCM transport.
#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// Server key sent as `Authorization: key=...`.
    pub api_key: String,
    /// Gateway URL. Overridable for relays and test servers.
    pub endpoint: String,
}

impl FcmConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `FCM_API_KEY` is not set, signalling that push
    /// delivery is not configured and the worker should refuse to start.
    ///
    /// | Variable       | Required | Default                               |
    /// |----------------|----------|---------------------------------------|
    /// | `FCM_API_KEY`  | yes      | —                                     |
    /// | `FCM_ENDPOINT` | no       | `https://fcm.googleapis.com/fcm/send` |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("FCM_API_KEY").ok()?;
        Some(Self {
            api_key,
            endpoint: std::env::var("FCM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_FCM_ENDPOINT.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// FcmTransport
// ---------------------------------------------------------------------------

/// Sends dispatch batches through the FCM legacy HTTP API.
pub struct FcmTransport {
    client: reqwest::Client,
    config: FcmConfig,
}

#[derive(Debug, Serialize)]
struct FcmRequest<'a> {
    registration_ids: &'a [String],
    notification: FcmNotification<'a>,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    success: i64,
    failure: i64,
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    #[serde(default)]
    error: Option<String>,
}

impl FcmTransport {
    /// Create a new transport with a pre-configured HTTP client.
    pub fn new(config: FcmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, config }
    }

    fn outcome_from(response: FcmResponse) -> BatchOutcome {
        let failure_details = response
            .results
            .into_iter()
            .filter_map(|result| result.error)
            .collect();
        BatchOutcome {
            success: response.success,
            failure: response.failure,
            failure_details,
        }
    }
}

#[async_trait]
impl PushTransport for FcmTransport {
    async fn send_batch(
        &self,
        device_tokens: &[String],
        title: &str,
        body: &str,
    ) -> Result<BatchOutcome, TransportError> {
        let payload = FcmRequest {
            registration_ids: device_tokens,
            notification: FcmNotification { title, body },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("key={}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status().as_u16()));
        }

        let decoded: FcmResponse = response
            .json()
            .await
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        Ok(Self::outcome_from(decoded))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FcmConfig {
        FcmConfig {
            api_key: "test-key".into(),
            endpoint: "http://localhost:0/fcm/send".into(),
        }
    }

    #[test]
    fn new_does_not_panic() {
        let _transport = FcmTransport::new(config());
    }

    #[test]
    fn transport_error_display_http_status() {
        let err = TransportError::HttpStatus(502);
        assert_eq!(err.to_string(), "Push gateway returned HTTP 502");
    }

    #[test]
    fn transport_error_display_malformed() {
        let err = TransportError::MalformedResponse("missing field `success`".into());
        assert!(err.to_string().contains("Malformed gateway response"));
    }

    #[test]
    fn gateway_response_decodes_counts_and_errors() {
        let decoded: FcmResponse = serde_json::from_str(
            r#"{
                "multicast_id": 216,
                "success": 2,
                "failure": 1,
                "results": [
                    { "message_id": "1:0408" },
                    { "error": "NotRegistered" },
                    { "message_id": "1:0409" }
                ]
            }"#,
        )
        .unwrap();
        let outcome = FcmTransport::outcome_from(decoded);
        assert_eq!(outcome.success, 2);
        assert_eq!(outcome.failure, 1);
        assert_eq!(outcome.failure_details, vec!["NotRegistered".to_string()]);
    }

    #[test]
    fn gateway_response_without_results_decodes() {
        let decoded: FcmResponse = serde_json::from_str(r#"{"success":0,"failure":0}"#).unwrap();
        let outcome = FcmTransport::outcome_from(decoded);
        assert_eq!(outcome, BatchOutcome::default());
    }

    #[test]
    fn request_payload_shape() {
        let tokens = vec!["tok-a".to_string(), "tok-b".to_string()];
        let payload = FcmRequest {
            registration_ids: &tokens,
            notification: FcmNotification { title: "Hello", body: "World" },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["registration_ids"], serde_json::json!(["tok-a", "tok-b"]));
        assert_eq!(json["notification"]["title"], "Hello");
        assert_eq!(json["notification"]["body"], "World");
    }
}
