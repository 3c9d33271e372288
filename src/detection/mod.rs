//! Scam classification: turn-aware confidence scoring and red-flag tagging.

pub mod red_flags;
pub mod scam;

pub use red_flags::{flags, flags_detailed, RedFlagMatch};
pub use scam::ScamDetector;
