//! The engagement controller — orchestrates one inbound message end to end.
//!
//! Per message: update detection state, extract intelligence, tag red
//! flags, obtain a phase directive, call the external generator, screen
//! its output, advance the session, and evaluate the one-shot report
//! policy. Every failure mode inside this path degrades to a safe
//! in-character reply; the correspondent never sees an error.

pub mod sanitizer;
pub mod wire;

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{DetectionConfig, EngagementConfig};
use crate::detection::red_flags;
use crate::detection::ScamDetector;
use crate::generator::Generator;
use crate::intel::Extractor;
use crate::patterns::PatternLibrary;
use crate::report::{EngagementMetrics, ReportPayload, Reporter};
use crate::session::phase::{self, Phase};
use crate::session::{Session, SessionStore};
use sanitizer::{CLOSING_REPLY, GREETING_REPLY};
use wire::{EngageReply, EngageRequest, HistoryEntry, MessageField};

/// Orchestrates sessions, detection, extraction, and reporting.
///
/// The session store, generator, and reporter are all injected by the
/// host, so the controller can be driven with fakes in tests and the
/// host decides how long session state lives.
pub struct EngagementController {
    store: Arc<SessionStore>,
    patterns: Arc<PatternLibrary>,
    extractor: Extractor,
    detector: ScamDetector,
    generator: Arc<dyn Generator>,
    reporter: Arc<dyn Reporter>,
    config: EngagementConfig,
}

impl EngagementController {
    /// Wire up a controller over the shared pattern library.
    pub fn new(
        patterns: Arc<PatternLibrary>,
        detection: DetectionConfig,
        engagement: EngagementConfig,
        store: Arc<SessionStore>,
        generator: Arc<dyn Generator>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            store,
            extractor: Extractor::new(Arc::clone(&patterns)),
            detector: ScamDetector::new(Arc::clone(&patterns), detection),
            patterns,
            generator,
            reporter,
            config: engagement,
        }
    }

    /// The session store, for host debug/health surfaces.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Process one inbound message and produce the reply envelope.
    ///
    /// Total: every internal failure degrades to a safe reply. The
    /// per-session lock is held for the whole call, so turns for one
    /// session serialize while distinct sessions proceed in parallel.
    pub async fn handle(&self, request: EngageRequest) -> EngageReply {
        let session_id = request
            .session_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(generate_session_id);

        let handle = self.store.get_or_create(&session_id).await;
        let mut session = handle.lock().await;

        // Closed-out sessions get a wind-down reply; the report still
        // fires here if the session closed at the cap without one.
        if session.report_sent || session.turns >= self.config.max_turns {
            info!(session_id = %session.id, turns = session.turns, "session closed out");
            let callback = if session.report_sent {
                Some("already sent")
            } else if session.detected {
                Some(self.dispatch_report(&mut session))
            } else {
                None
            };
            return self.envelope(&session, CLOSING_REPLY.to_owned(), callback);
        }

        // A request without usable message text mutates nothing.
        let message_text = request
            .message
            .as_ref()
            .map(MessageField::text)
            .unwrap_or_default()
            .to_owned();
        if message_text.is_empty() {
            return self.envelope(&session, GREETING_REPLY.to_owned(), None);
        }
        session.last_activity = Utc::now();

        // Front-loaded context on session start: replay it before the
        // live message. Sessions with prior turns already hold this state.
        if session.turns == 0 && !request.conversation_history.is_empty() {
            self.seed_history(&mut session, &request.conversation_history);
        }

        let next_turn = session.turns.saturating_add(1);
        info!(session_id = %session.id, turn = next_turn, "processing inbound message");

        if !session.detected {
            session.detected = self.detector.classify(&message_text, next_turn);
        }
        self.extractor.extract(&message_text, &mut session.evidence);
        session.note_red_flags(red_flags::flags(&message_text));

        let reply = if session.detected {
            self.generate_reply(&session, &message_text, next_turn).await
        } else {
            let keyword_hits = self.patterns.keyword_hits(&message_text);
            if keyword_hits >= 2 {
                // Enough signal to pin the session even though the
                // detector was consulted before extraction.
                session.detected = true;
                sanitizer::suspicion_reply().to_owned()
            } else if keyword_hits == 1 {
                sanitizer::suspicion_reply().to_owned()
            } else {
                GREETING_REPLY.to_owned()
            }
        };

        session.record_exchange(message_text, reply.clone());

        let mut callback = None;
        let floor_reached = session.turns >= self.config.min_turns
            || session.turns >= self.config.max_turns;
        if session.detected && !session.report_sent && floor_reached {
            callback = Some(self.dispatch_report(&mut session));
        }

        self.envelope(&session, reply, callback)
    }

    /// Ask the generator for an in-character reply; screen the result.
    ///
    /// Never fails: sanitization rejection and generator errors both
    /// substitute from the fallback rotation.
    async fn generate_reply(&self, session: &Session, message: &str, next_turn: u32) -> String {
        let directive = phase::directive(Phase::for_turn(next_turn), &session.evidence);
        let recent = session.recent_exchanges(self.config.context_window);
        match self.generator.generate(&directive, recent, message).await {
            Ok(raw) => sanitizer::sanitize(&raw, self.config.reply_max_chars)
                .unwrap_or_else(|| sanitizer::fallback_reply(session.turns).to_owned()),
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "generator failed; substituting fallback");
                sanitizer::fallback_reply(session.turns).to_owned()
            }
        }
    }

    /// Replay caller-supplied history through the extractor, detector,
    /// and classifier. Only correspondent-side entries feed evidence —
    /// our own replies carry no intelligence. Completed (correspondent,
    /// reply) pairs also seed the conversation log so the turn counter
    /// matches the log length; a trailing unanswered message
    /// contributes evidence only. Called only on a fresh session.
    fn seed_history(&self, session: &mut Session, history: &[HistoryEntry]) {
        let mut inbound_seen = 0_u32;
        for entry in history {
            let text = entry.text.trim();
            if text.is_empty() || is_our_side(&entry.sender) {
                continue;
            }
            inbound_seen = inbound_seen.saturating_add(1);
            self.extractor.extract(text, &mut session.evidence);
            session.note_red_flags(red_flags::flags(text));
            if !session.detected {
                session.detected = self.detector.classify(text, inbound_seen);
            }
        }

        let mut pending: Option<&str> = None;
        for entry in history {
            if is_our_side(&entry.sender) {
                if let Some(inbound) = pending.take() {
                    session.record_exchange(inbound, entry.text.clone());
                }
            } else {
                pending = Some(entry.text.as_str());
            }
        }
        info!(
            session_id = %session.id,
            seeded_turns = session.turns,
            "seeded session from caller-supplied history"
        );
    }

    /// Flip the report latch and dispatch in the background.
    ///
    /// The reply path never waits on delivery; the latch stays true
    /// whatever the outcome, so a broken endpoint is attempted once.
    fn dispatch_report(&self, session: &mut Session) -> &'static str {
        session.report_sent = true;
        let payload = report_payload(session);
        let reporter = Arc::clone(&self.reporter);
        let session_id = session.id.clone();
        tokio::spawn(async move {
            match reporter.report(&payload).await {
                Ok(outcome) => {
                    info!(session_id = %session_id, ?outcome, "intelligence report delivered");
                }
                Err(e) => {
                    error!(session_id = %session_id, error = %e, "intelligence report failed; not retrying");
                }
            }
        });
        "dispatched"
    }

    /// Assemble the success envelope from current session state.
    fn envelope(
        &self,
        session: &Session,
        reply: String,
        callback: Option<&'static str>,
    ) -> EngageReply {
        let duration = session.engagement_seconds();
        EngageReply {
            status: "success",
            reply,
            session_id: session.id.clone(),
            scam_detected: session.detected,
            messages_exchanged: session.turns,
            phase: session.phase,
            extracted_intelligence: session.evidence.clone(),
            red_flags_identified: session.red_flags.clone(),
            callback_sent: callback.map(str::to_owned),
            engagement_metrics: EngagementMetrics {
                total_messages_exchanged: session.turns,
                engagement_duration_seconds: duration,
            },
            agent_notes: agent_notes(session, duration),
        }
    }
}

/// Whether a history entry came from our side of the conversation.
fn is_our_side(sender: &str) -> bool {
    matches!(sender, "user" | "agent")
}

/// Session id for callers that did not supply one.
fn generate_session_id() -> String {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(8);
    format!("auto-{hex}")
}

/// Summary line carried in the reply envelope and the report.
fn agent_notes(session: &Session, duration: u64) -> String {
    let flags = if session.red_flags.is_empty() {
        "none detected yet".to_owned()
    } else {
        session.red_flags.join(", ")
    };
    let evidence = &session.evidence;
    format!(
        "Engaged suspected scammer for {} exchanges over {}s. Phase: {}. \
         Red flags identified: {}. Scam detected: {}. Intelligence: {} items \
         (handles: {}, phones: {}, accounts: {}, links: {}, emails: {}).",
        session.turns,
        duration,
        session.phase,
        flags,
        session.detected,
        evidence.identifier_count(),
        evidence.payment_handles.len(),
        evidence.phone_numbers.len(),
        evidence.bank_accounts.len(),
        evidence.phishing_links.len(),
        evidence.email_addresses.len(),
    )
}

/// The full observer payload for one session.
fn report_payload(session: &Session) -> ReportPayload {
    let duration = session.engagement_seconds();
    ReportPayload {
        session_id: session.id.clone(),
        status: "success",
        scam_detected: session.detected,
        total_messages_exchanged: session.turns,
        extracted_intelligence: session.evidence.clone(),
        red_flags_identified: session.red_flags.clone(),
        engagement_metrics: EngagementMetrics {
            total_messages_exchanged: session.turns,
            engagement_duration_seconds: duration,
        },
        agent_notes: agent_notes(session, duration),
    }
}
