//! Inbound request and reply envelope shapes.
//!
//! Callers send loosely-shaped JSON; every field is optional and the
//! message may be a bare string or a structured object. The reply is
//! always a `status: "success"` envelope — internal failures never
//! produce an error envelope, because a malformed or erroring response
//! would immediately tell an adversarial correspondent that something
//! unusual is on the other end.

use serde::{Deserialize, Serialize};

use crate::intel::Evidence;
use crate::report::EngagementMetrics;
use crate::session::phase::Phase;

/// One inbound engagement request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngageRequest {
    /// Session identifier; generated when absent.
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,

    /// The correspondent's message.
    #[serde(default)]
    pub message: Option<MessageField>,

    /// Prior turns supplied by callers who front-load context.
    #[serde(default, alias = "conversation_history")]
    pub conversation_history: Vec<HistoryEntry>,
}

/// A message, either as a bare string or a structured object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageField {
    /// `"message": "text"`.
    Text(String),
    /// `"message": {"text": "...", "sender": "...", "timestamp": ...}`.
    Structured {
        /// Message body.
        #[serde(default, alias = "content")]
        text: String,
        /// Sender tag, unused by the engine.
        #[serde(default)]
        sender: Option<String>,
        /// Caller-side timestamp, unused by the engine.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}

impl MessageField {
    /// The trimmed message text, whatever the wire shape.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Structured { text, .. } => text.trim(),
        }
    }
}

/// One prior turn in a caller-supplied history.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    /// `"scammer"` for the correspondent, `"user"` for our side.
    #[serde(default = "default_sender")]
    pub sender: String,

    /// What was said.
    #[serde(default, alias = "content")]
    pub text: String,
}

fn default_sender() -> String {
    "scammer".to_string()
}

/// The fixed-shape success envelope returned for every request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngageReply {
    /// Always `"success"`.
    pub status: &'static str,

    /// The in-character reply for the correspondent.
    pub reply: String,

    /// Session identifier (echoed or generated).
    pub session_id: String,

    /// Whether the session is classified as a scam.
    pub scam_detected: bool,

    /// Turns processed so far.
    pub messages_exchanged: u32,

    /// Current conversation phase.
    pub phase: Phase,

    /// Cumulative extracted identifiers.
    pub extracted_intelligence: Evidence,

    /// Cumulative red-flag labels.
    pub red_flags_identified: Vec<String>,

    /// Report dispatch marker, present only when attempted this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_sent: Option<String>,

    /// Engagement statistics.
    pub engagement_metrics: EngagementMetrics,

    /// Human-readable summary line for observers.
    pub agent_notes: String,
}

impl EngageReply {
    /// The safe envelope for requests the engine could not use at all
    /// (unparsable body, missing message text). No session is touched.
    pub fn safe_default(reply: impl Into<String>) -> Self {
        Self {
            status: "success",
            reply: reply.into(),
            session_id: String::new(),
            scam_detected: false,
            messages_exchanged: 0,
            phase: Phase::Opening,
            extracted_intelligence: Evidence::default(),
            red_flags_identified: Vec::new(),
            callback_sent: None,
            engagement_metrics: EngagementMetrics {
                total_messages_exchanged: 0,
                engagement_duration_seconds: 0,
            },
            agent_notes: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_with_bare_string_message() {
        let req: EngageRequest =
            serde_json::from_str(r#"{"sessionId": "s1", "message": "hello there"}"#)
                .expect("parses");
        assert_eq!(req.session_id.as_deref(), Some("s1"));
        assert_eq!(req.message.as_ref().map(MessageField::text), Some("hello there"));
    }

    #[test]
    fn test_request_with_structured_message() {
        let raw = r#"{
            "sessionId": "s2",
            "message": {"sender": "scammer", "text": " send otp now ", "timestamp": 1770005528731},
            "conversationHistory": [
                {"sender": "scammer", "text": "you won a lottery"},
                {"sender": "user", "text": "who is this?"}
            ]
        }"#;
        let req: EngageRequest = serde_json::from_str(raw).expect("parses");
        assert_eq!(req.message.as_ref().map(MessageField::text), Some("send otp now"));
        assert_eq!(req.conversation_history.len(), 2);
        assert_eq!(req.conversation_history[1].sender, "user");
    }

    #[test]
    fn test_request_with_snake_case_aliases() {
        let raw = r#"{"session_id": "s3", "message": {"content": "pay the fee"}, "conversation_history": []}"#;
        let req: EngageRequest = serde_json::from_str(raw).expect("parses");
        assert_eq!(req.session_id.as_deref(), Some("s3"));
        assert_eq!(req.message.as_ref().map(MessageField::text), Some("pay the fee"));
    }

    #[test]
    fn test_request_with_everything_missing() {
        let req: EngageRequest = serde_json::from_str("{}").expect("parses");
        assert!(req.session_id.is_none());
        assert!(req.message.is_none());
        assert!(req.conversation_history.is_empty());
    }

    #[test]
    fn test_reply_envelope_serializes_camel_case() {
        let reply = EngageReply::safe_default("Hello. How can I help you?");
        let json = serde_json::to_value(&reply).expect("serializes");
        assert_eq!(json["status"], "success");
        assert_eq!(json["reply"], "Hello. How can I help you?");
        assert_eq!(json["scamDetected"], false);
        assert_eq!(json["messagesExchanged"], 0);
        assert!(json["extractedIntelligence"]["paymentHandles"].is_array());
        // Dispatch marker is omitted entirely when no report was attempted.
        assert!(json.get("callbackSent").is_none());
    }
}
