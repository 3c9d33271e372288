//! Per-conversation state and the concurrent session store.
//!
//! A [`Session`] is mutated only by the engagement controller, during the
//! synchronous handling of one inbound message at a time; the store hands
//! out each session behind its own `tokio::sync::Mutex` so turns for one
//! session serialize while distinct sessions proceed in parallel. State is
//! process-lifetime only — there is no persistence layer.

pub mod phase;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::intel::Evidence;
use phase::Phase;

/// One completed exchange: inbound text and the reply we produced.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    /// What the correspondent sent.
    pub inbound: String,
    /// What we replied.
    pub reply: String,
    /// When the exchange was recorded.
    pub timestamp: DateTime<Utc>,
}

/// State of one tracked conversation.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session identifier.
    pub id: String,
    /// Completed exchanges; always equals `conversation.len()`.
    pub turns: u32,
    /// Current phase, recomputed from `turns` after every exchange.
    pub phase: Phase,
    /// Monotonic scam flag — once true, never reset.
    pub detected: bool,
    /// Accumulated identifiers; sets never shrink.
    pub evidence: Evidence,
    /// Cumulative red-flag labels in first-seen order.
    pub red_flags: Vec<String>,
    /// Conversation log, the generator's context window and report input.
    pub conversation: Vec<Exchange>,
    /// One-way latch guarding the one-shot report.
    pub report_sent: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time a message touched this session (for external reaping).
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            turns: 0,
            phase: Phase::for_turn(0),
            detected: false,
            evidence: Evidence::default(),
            red_flags: Vec::new(),
            conversation: Vec::new(),
            report_sent: false,
            created_at: now,
            last_activity: now,
        }
    }

    /// Union red-flag labels into the cumulative set, preserving order.
    pub fn note_red_flags<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for label in labels {
            let label = label.into();
            if !self.red_flags.contains(&label) {
                self.red_flags.push(label);
            }
        }
    }

    /// Append an exchange, advance the turn counter, recompute the phase.
    pub fn record_exchange(&mut self, inbound: impl Into<String>, reply: impl Into<String>) {
        self.conversation.push(Exchange {
            inbound: inbound.into(),
            reply: reply.into(),
            timestamp: Utc::now(),
        });
        self.turns = self.turns.saturating_add(1);
        self.phase = Phase::for_turn(self.turns);
    }

    /// The last `window` exchanges, oldest first.
    pub fn recent_exchanges(&self, window: usize) -> &[Exchange] {
        let start = self.conversation.len().saturating_sub(window);
        self.conversation.get(start..).unwrap_or(&[])
    }

    /// Seconds since the session was created, clamped at zero.
    pub fn engagement_seconds(&self) -> u64 {
        let elapsed = Utc::now().signed_duration_since(self.created_at);
        u64::try_from(elapsed.num_seconds().max(0)).unwrap_or(0)
    }
}

/// One row of [`SessionStore::summaries`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: String,
    /// Turns processed so far.
    pub turns: u32,
    /// Current phase.
    pub phase: Phase,
    /// Whether the session is classified as a scam.
    pub detected: bool,
    /// Whether the one-shot report has fired.
    pub report_sent: bool,
}

/// Concurrency-safe map of session id → session.
///
/// The outer `RwLock` only guards map membership; each session carries
/// its own mutex, so processing one session never blocks another.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a session, creating it on first reference.
    pub async fn get_or_create(&self, id: &str) -> Arc<Mutex<Session>> {
        {
            let map = self.inner.read().await;
            if let Some(handle) = map.get(id) {
                return Arc::clone(handle);
            }
        }
        let mut map = self.inner.write().await;
        // A racing creator may have won between the two locks.
        if let Some(handle) = map.get(id) {
            return Arc::clone(handle);
        }
        info!(session_id = id, "creating new session");
        let handle = Arc::new(Mutex::new(Session::new(id)));
        map.insert(id.to_owned(), Arc::clone(&handle));
        handle
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store has no sessions.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Snapshot summaries of every session, for host debug surfaces.
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        let handles: Vec<Arc<Mutex<Session>>> =
            self.inner.read().await.values().map(Arc::clone).collect();
        let mut rows = Vec::with_capacity(handles.len());
        for handle in handles {
            let session = handle.lock().await;
            rows.push(SessionSummary {
                session_id: session.id.clone(),
                turns: session.turns,
                phase: session.phase,
                detected: session.detected,
                report_sent: session.report_sent,
            });
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_exchange_keeps_log_length_invariant() {
        let mut session = Session::new("s1");
        for i in 0..7 {
            session.record_exchange(format!("msg {i}"), "ok");
            let log_len = u32::try_from(session.conversation.len()).expect("fits");
            assert_eq!(session.turns, log_len);
        }
    }

    #[test]
    fn test_phase_tracks_turns() {
        let mut session = Session::new("s1");
        assert_eq!(session.phase, Phase::Opening);
        for _ in 0..6 {
            session.record_exchange("hi", "hello");
        }
        assert_eq!(session.turns, 6);
        assert_eq!(session.phase, Phase::Pressing);
    }

    #[test]
    fn test_note_red_flags_dedupes_preserving_order() {
        let mut session = Session::new("s1");
        session.note_red_flags(["Urgency / pressure tactics", "Request for secrecy"]);
        session.note_red_flags(["Request for secrecy", "Urgency / pressure tactics"]);
        assert_eq!(
            session.red_flags,
            vec!["Urgency / pressure tactics", "Request for secrecy"]
        );
    }

    #[test]
    fn test_recent_exchanges_window() {
        let mut session = Session::new("s1");
        for i in 0..10 {
            session.record_exchange(format!("in {i}"), format!("out {i}"));
        }
        let recent = session.recent_exchanges(6);
        assert_eq!(recent.len(), 6);
        assert_eq!(recent.first().map(|e| e.inbound.as_str()), Some("in 4"));
        assert_eq!(recent.last().map(|e| e.inbound.as_str()), Some("in 9"));
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_session() {
        let store = SessionStore::new();
        let a = store.get_or_create("abc").await;
        {
            let mut session = a.lock().await;
            session.detected = true;
        }
        let b = store.get_or_create("abc").await;
        assert!(b.lock().await.detected);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.get_or_create("a").await;
        let _guard = a.lock().await;
        // Locking "a" must not block access to "b".
        let b = store.get_or_create("b").await;
        let session_b = b.lock().await;
        assert_eq!(session_b.turns, 0);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_summaries_snapshot() {
        let store = SessionStore::new();
        {
            let handle = store.get_or_create("s1").await;
            let mut session = handle.lock().await;
            session.record_exchange("hello", "hi");
        }
        let rows = store.summaries().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().map(|r| r.turns), Some(1));
    }
}
