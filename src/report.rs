//! One-shot intelligence reporting.
//!
//! When a detected session crosses the engagement floor (or hits the turn
//! cap) the controller dispatches a single report to an external observer.
//! Dispatch is fire-and-forget: attempt once, log the outcome, never
//! retry, never surface anything to the correspondent-facing reply.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::intel::Evidence;

/// Engagement statistics included in reports and reply telemetry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    /// Turns processed for the session.
    pub total_messages_exchanged: u32,
    /// Seconds between session creation and now.
    pub engagement_duration_seconds: u64,
}

/// The full report delivered to the observer endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    /// Session identifier.
    pub session_id: String,
    /// Always `"success"` — the envelope convention of the observer API.
    pub status: &'static str,
    /// Whether the session was classified as a scam.
    pub scam_detected: bool,
    /// Turns processed.
    pub total_messages_exchanged: u32,
    /// Everything extracted so far.
    pub extracted_intelligence: Evidence,
    /// Cumulative red-flag labels.
    pub red_flags_identified: Vec<String>,
    /// Engagement statistics.
    pub engagement_metrics: EngagementMetrics,
    /// Human-readable summary for investigators.
    pub agent_notes: String,
}

/// Report delivery failure modes.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The HTTP request could not be completed.
    #[error("report request failed: {0}")]
    RequestFailed(String),
    /// The observer endpoint answered with a non-success status.
    #[error("report rejected with HTTP {status}")]
    Rejected {
        /// HTTP status code returned by the endpoint.
        status: u16,
    },
}

/// How a report attempt concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Delivered over HTTP with the given status code.
    Delivered {
        /// HTTP status code returned by the endpoint.
        status: u16,
    },
    /// No endpoint configured; payload was logged locally instead.
    Logged,
}

/// Delivers one report to the external observer.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Attempt delivery exactly once.
    async fn report(&self, payload: &ReportPayload) -> Result<ReportOutcome, ReportError>;
}

/// HTTP reporter posting the payload as JSON.
pub struct HttpReporter {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpReporter {
    /// Build a reporter for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: Url, timeout_seconds: u64) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ReportError::RequestFailed(e.to_string()))?;
        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl Reporter for HttpReporter {
    async fn report(&self, payload: &ReportPayload) -> Result<ReportOutcome, ReportError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| ReportError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            Ok(ReportOutcome::Delivered {
                status: status.as_u16(),
            })
        } else {
            Err(ReportError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

/// Reporter used when no endpoint is configured: logs and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

#[async_trait]
impl Reporter for LogReporter {
    async fn report(&self, payload: &ReportPayload) -> Result<ReportOutcome, ReportError> {
        tracing::info!(
            session_id = %payload.session_id,
            turns = payload.total_messages_exchanged,
            identifiers = payload.extracted_intelligence.identifier_count(),
            "no report endpoint configured; logging report locally"
        );
        Ok(ReportOutcome::Logged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ReportPayload {
        let mut evidence = Evidence::default();
        evidence.payment_handles.push("scam@fakebank".to_owned());
        ReportPayload {
            session_id: "s1".to_owned(),
            status: "success",
            scam_detected: true,
            total_messages_exchanged: 5,
            extracted_intelligence: evidence,
            red_flags_identified: vec!["Urgency / pressure tactics".to_owned()],
            engagement_metrics: EngagementMetrics {
                total_messages_exchanged: 5,
                engagement_duration_seconds: 42,
            },
            agent_notes: "engaged for 5 exchanges".to_owned(),
        }
    }

    #[test]
    fn test_payload_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(payload()).expect("serializes");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["scamDetected"], true);
        assert_eq!(json["totalMessagesExchanged"], 5);
        assert!(json["extractedIntelligence"]["paymentHandles"].is_array());
        assert!(json["redFlagsIdentified"].is_array());
        assert_eq!(json["engagementMetrics"]["engagementDurationSeconds"], 42);
        assert!(json["agentNotes"].is_string());
    }

    #[tokio::test]
    async fn test_log_reporter_succeeds() {
        let outcome = LogReporter.report(&payload()).await.expect("logs");
        assert_eq!(outcome, ReportOutcome::Logged);
    }
}
