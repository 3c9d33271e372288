//! Turn-aware scam detection.
//!
//! Three additive signal layers feed a confidence score: keyword hits,
//! extractable identifier shapes, and red-flag category matches. The
//! decision threshold loosens as the conversation deepens — turn 1 must
//! not fire on a bare greeting, while a conversation several turns in is
//! overwhelmingly likely adversarial. Once a session is detected the flag
//! is pinned and this detector is not consulted again for that session.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::detection::red_flags;
use crate::patterns::PatternLibrary;

/// Confidence-scoring scam detector.
#[derive(Debug, Clone)]
pub struct ScamDetector {
    patterns: Arc<PatternLibrary>,
    config: DetectionConfig,
}

impl ScamDetector {
    /// Create a detector over the shared pattern library.
    pub fn new(patterns: Arc<PatternLibrary>, config: DetectionConfig) -> Self {
        Self { patterns, config }
    }

    /// Accumulate the confidence score for one message.
    ///
    /// Signals are additive, not mutually exclusive.
    pub fn confidence(&self, text: &str) -> f64 {
        let mut confidence = 0.0;

        let keyword_hits = self.patterns.keyword_hits(text);
        if keyword_hits >= 2 {
            confidence += self.config.keyword_multi_weight;
            debug!(keyword_hits, "scam signal: multiple keyword hits");
        } else if keyword_hits == 1 {
            confidence += self.config.keyword_single_weight;
            debug!("scam signal: single keyword hit");
        }

        let identifier_hits = self.patterns.identifier_type_hits(text);
        for _ in 0..identifier_hits {
            confidence += self.config.identifier_weight;
        }
        if identifier_hits > 0 {
            debug!(identifier_hits, "scam signal: identifier shapes present");
        }

        // One flat bump no matter how many categories match.
        if !red_flags::flags(text).is_empty() {
            confidence += self.config.red_flag_weight;
            debug!("scam signal: red-flag category match");
        }

        confidence
    }

    /// Decide whether `text`, arriving at 1-based `turn`, is scam content.
    pub fn classify(&self, text: &str, turn: u32) -> bool {
        let confidence = self.confidence(text);
        let threshold = self.config.threshold(turn);
        let detected = confidence >= threshold;
        info!(turn, confidence, threshold, detected, "scam classification");
        detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> ScamDetector {
        ScamDetector::new(
            Arc::new(PatternLibrary::new().expect("patterns compile")),
            DetectionConfig::default(),
        )
    }

    #[test]
    fn test_turn_one_greeting_is_not_a_scam() {
        let det = detector();
        assert!(!det.classify("hello, good morning", 1));
    }

    #[test]
    fn test_turn_one_two_keywords_trigger() {
        let det = detector();
        // "account", "blocked", "verify", "immediately", "otp" — well past
        // the two-keyword bump, plus an urgency red flag.
        assert!(det.classify(
            "Your account is blocked, verify immediately and send OTP",
            1
        ));
    }

    #[test]
    fn test_threshold_loosens_with_turn() {
        let config = DetectionConfig::default();
        assert!(config.threshold(1) > config.threshold(2));
        assert!(config.threshold(2) > config.threshold(3));
        assert_eq!(config.threshold(3), config.threshold(9));
    }

    #[test]
    fn test_single_keyword_scores_the_single_weight() {
        let det = detector();
        // Exactly one keyword ("click"), no red-flag trigger ("click here"
        // and "click link" need the full phrase), no identifier shapes.
        let confidence = det.confidence("just click okay");
        assert!((confidence - det.config.keyword_single_weight).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_signals_never_detects_even_late() {
        let det = detector();
        assert!(!det.classify("how are you doing these days", 9));
    }

    #[test]
    fn test_identifier_shapes_raise_confidence() {
        let det = detector();
        let without = det.confidence("please respond soon");
        let with = det.confidence("please respond soon on 9876543210");
        assert!(with > without);
    }

    #[test]
    fn test_red_flag_bump_is_flat() {
        let det = detector();
        // Both texts hit red-flag categories but no keywords/identifiers;
        // two categories must not score higher than one.
        let one = det.confidence("this is between us");
        let two = det.confidence("this is between us, act now");
        // "act now" adds an urgency trigger but no scam keyword.
        assert!((two - one).abs() < f64::EPSILON);
    }
}
