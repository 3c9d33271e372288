//! Conversation phase state machine.
//!
//! The phase is a pure function of the turn counter — forward-only, no
//! guards, no back-transitions. The phase picks the behavioral directive
//! handed to the dialogue generator; the directive additionally names the
//! identifier categories still missing from the session's evidence so
//! each reply targets what remains unknown.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::intel::Evidence;

/// Last turn of the opening phase.
pub const OPENING_MAX_TURN: u32 = 2;
/// Last turn of the building phase.
pub const BUILDING_MAX_TURN: u32 = 5;
/// Last turn of the pressing phase; beyond this the session is closing.
pub const PRESSING_MAX_TURN: u32 = 8;

/// Engagement phase, ordered by conversation depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// First exchanges: sound like a confused stranger, extract nothing.
    Opening,
    /// Mild engagement: one natural follow-up question per reply.
    Building,
    /// Active elicitation of identifiers.
    Pressing,
    /// Maximum extraction under a pretext of mounting doubt.
    Closing,
}

impl Phase {
    /// Derive the phase for a 1-based turn index.
    pub fn for_turn(turn: u32) -> Self {
        if turn <= OPENING_MAX_TURN {
            Self::Opening
        } else if turn <= BUILDING_MAX_TURN {
            Self::Building
        } else if turn <= PRESSING_MAX_TURN {
            Self::Pressing
        } else {
            Self::Closing
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Opening => "opening",
            Self::Building => "building",
            Self::Pressing => "pressing",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Build the generator directive for a phase against current evidence.
///
/// Pure: never calls the generator, never mutates evidence.
pub fn directive(phase: Phase, evidence: &Evidence) -> String {
    let base = match phase {
        Phase::Opening => {
            "You just received this message from a stranger out of the blue. \
             Sound naturally confused or curious — you do not know who this is. \
             Ask one simple question about who they are. Do not ask for phone \
             numbers, payment IDs, links, or emails yet; nobody does that on a \
             first contact. Keep it to one or two short sentences."
        }
        Phase::Building => {
            "You are starting to understand what they want. Show mild concern \
             or interest in what they said, and ask one natural follow-up \
             question — their callback number, or which organization they are \
             from. Only one question per reply; stay casual and in character."
        }
        Phase::Pressing => {
            "You are engaged and inclined to believe them. Ask for verification \
             details more actively: their payment handle, a callback number, \
             the exact link they want you to open. Ask for one or two items per \
             reply, and plead confusion with technology to stay believable."
        }
        Phase::Closing => {
            "You are ready to comply but must have their details first, and \
             your family keeps warning you about fraud. In every reply ask for \
             at least two different missing items, citing those doubts as the \
             reason you need proof. Keep extracting while sounding increasingly \
             hesitant."
        }
    };

    let missing = evidence.missing_categories();
    if missing.is_empty() {
        format!("{base}\n\nStill missing: nothing specific — press for any new contact detail.")
    } else {
        format!("{base}\n\nStill missing: their {}.", missing.join(", "))
    }
}
