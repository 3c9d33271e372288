//! Dialogue generator abstraction.
//!
//! The engine never produces in-character dialogue itself — it hands a
//! behavioral directive plus a short conversation window to a [`Generator`]
//! and sanitizes whatever comes back. The trait exists so the controller
//! can be tested with a fake implementation; the shipped implementation
//! speaks an OpenAI-style `/chat/completions` API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeneratorConfig;
use crate::session::Exchange;

/// Generator failure modes.
///
/// None of these ever reach the correspondent: every error is swallowed
/// by the controller's fallback substitution.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// HTTP request to the generation service failed.
    #[error("generation request failed: {0}")]
    RequestFailed(String),
    /// The service answered but produced nothing usable.
    #[error("generator returned empty output")]
    EmptyOutput,
    /// No generation backend is configured.
    #[error("no generator configured")]
    Unavailable,
}

/// Produces one in-character reply from a directive and context window.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a reply to `message` given the phase `directive` and the
    /// most recent exchanges (oldest first).
    async fn generate(
        &self,
        directive: &str,
        recent: &[Exchange],
        message: &str,
    ) -> Result<String, GeneratorError>;
}

/// Always-failing generator used when no API key is configured.
///
/// Keeps the controller on a single code path: the failure is absorbed by
/// the fallback rotation like any transient generator error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    async fn generate(
        &self,
        _directive: &str,
        _recent: &[Exchange],
        _message: &str,
    ) -> Result<String, GeneratorError> {
        Err(GeneratorError::Unavailable)
    }
}

/// Chat-completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

/// A message in chat format.
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Chat-completions response body.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// A single response choice.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

/// Assistant message inside a choice.
#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// HTTP generator against an OpenAI-style chat-completions endpoint.
pub struct ChatGenerator {
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f64,
    client: reqwest::Client,
}

impl ChatGenerator {
    /// Build a generator from config plus the resolved API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &GeneratorConfig, api_key: String) -> Result<Self, GeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client,
        })
    }

    /// Assemble the chat transcript: directive as system, then the window
    /// as alternating user/assistant turns, then the new message.
    fn build_messages(directive: &str, recent: &[Exchange], message: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: directive.to_owned(),
        }];
        for exchange in recent {
            messages.push(ChatMessage {
                role: "user",
                content: exchange.inbound.clone(),
            });
            messages.push(ChatMessage {
                role: "assistant",
                content: exchange.reply.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: message.to_owned(),
        });
        messages
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    async fn generate(
        &self,
        directive: &str,
        recent: &[Exchange],
        message: &str,
    ) -> Result<String, GeneratorError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.model.clone(),
            messages: Self::build_messages(directive, recent, message),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("(body unreadable: {e})"));
            return Err(GeneratorError::RequestFailed(format!(
                "HTTP {status}: {text}"
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_owned())
            .unwrap_or_default();

        if reply.is_empty() {
            return Err(GeneratorError::EmptyOutput);
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_disabled_generator_always_fails() {
        let gen = DisabledGenerator;
        let result = gen.generate("directive", &[], "hello").await;
        assert!(matches!(result, Err(GeneratorError::Unavailable)));
    }

    #[test]
    fn test_build_messages_interleaves_window() {
        let recent = vec![
            Exchange {
                inbound: "you won a prize".to_owned(),
                reply: "who is this?".to_owned(),
                timestamp: Utc::now(),
            },
            Exchange {
                inbound: "pay the fee".to_owned(),
                reply: "which fee?".to_owned(),
                timestamp: Utc::now(),
            },
        ];
        let messages = ChatGenerator::build_messages("be confused", &recent, "send otp");
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec!["system", "user", "assistant", "user", "assistant", "user"]
        );
        assert_eq!(messages.first().map(|m| m.content.as_str()), Some("be confused"));
        assert_eq!(messages.last().map(|m| m.content.as_str()), Some("send otp"));
    }
}
