//! Reply sanitization and canned fallbacks.
//!
//! Generator output is screened before it reaches the correspondent: a
//! reply that leaks reasoning, breaks character, or runs too long is
//! discarded and replaced from a fixed rotation of in-character probes.
//! The rotation is indexed by turn counter so consecutive fallbacks do
//! not repeat.

use rand::seq::SliceRandom;
use tracing::warn;

/// Phrases that mark a generated reply as out of character or as
/// leaked model reasoning. Matching is case-insensitive substring.
pub const FORBIDDEN_PHRASES: &[&str] = &[
    "the user", "the scammer", "user wants", "scammer wants",
    "training data", "output format", "instructions",
    "i will", "i need to", "let me", "i should",
    "as an ai", "as a language model", "i'm an ai",
    "the victim", "the agent", "honeypot",
    "generate", "scenario", "realistic", "respond with",
    "here is", "here's the", "the response",
    "i am calling from", "this is bank", "i am from bank",
    "we need your", "please provide your", "share your",
];

/// Canned in-character replies, rotated by turn counter.
///
/// Every entry actively probes for a contact identifier so even a dead
/// generator keeps eliciting intelligence. Ordered roughly by
/// escalating directness to pair with deepening conversations.
pub const FALLBACK_REPLIES: &[&str] = &[
    "Haan ji? Kaun bol raha hai? Aapka phone number kya hai... main call back karungi verify karne ke liye?",
    "Arey arey... blocked matlab? Aap pakka bank se ho? Aapka direct number do na, main khud call karungi.",
    "Acha acha... par kahan bhejoon paisa? Woh UPI ID phir se bolo na slowly... likhti hoon... @ ke baad kya aata hai?",
    "Account number chahiye aapko? Woh passbook mein likha hai... par pehle aapka account number bolo jismein bhejoon?",
    "Woh link wala message phir se bhejo... phone pe chhota likha hai dikha nahi. Pura URL bolo na http se?",
    "Email pe bhej do details beta... mera beta padhega. Aapka email ID kya hai? Gmail hai ya office wala?",
    "Haan haan main bhejti hoon... par UPI ID kya tha aapka? Woh @ wala phir se bolo na? Aur phone number bhi do backup ke liye.",
    "Aap branch ka phone number do na... landline hoga na? Aur woh website ka link bhi bhejo, main beta se check karwaungi.",
    "Theek hai... aapka website kya hai? Link bhejo WhatsApp pe. Aur email bhi do, main documents forward karungi.",
    "Padosan fraud fraud bol rahi thi... aapka official email bhejo, phone number do, aur UPI ID bhi — mera beta sab verify karega.",
    "Main confuse ho gayi... ek kaam karo — apna phone number, UPI ID, aur bank account number sab ek saath bol do. Main likh leti hoon.",
    "Arey sun nahi paya... woh link phir se bolo? Aur email pe bhi bhej do. Mera beta aayega toh check karega.",
];

/// Low-commitment replies for a message that smells off but has not
/// crossed the detection threshold.
pub const SUSPICION_REPLIES: &[&str] = &[
    "Ji? Kaun bol raha hai? Pehchaan nahi aaya...",
    "Hello? Haan ji, kaun?",
    "Arey, kaun hai? Kya baat hai?",
    "Ji haan, boliye? Aap kaun bol rahe ho?",
    "Hello? Aap kaun? Main samajh nahi paayi...",
    "Ji? Kya hua? Aap kaun bol rahe ho?",
];

/// Neutral reply for clean messages and unusable requests.
pub const GREETING_REPLY: &str = "Hello. How can I help you?";

/// Reply used once a session has closed out (report sent or turn cap).
pub const CLOSING_REPLY: &str = "Acha beta, main baad mein baat karti hoon. Abhi mujhe kaam hai.";

/// Screen a generated reply.
///
/// Returns the trimmed reply, or `None` when it is empty, exceeds
/// `max_chars`, or contains any forbidden phrase — the caller then
/// substitutes from the fallback rotation.
pub fn sanitize(raw: &str, max_chars: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() > max_chars {
        warn!(chars = trimmed.chars().count(), "discarding overlong generated reply");
        return None;
    }
    let lower = trimmed.to_lowercase();
    if let Some(phrase) = FORBIDDEN_PHRASES.iter().find(|p| lower.contains(**p)) {
        warn!(phrase, "discarding generated reply with forbidden phrase");
        return None;
    }
    Some(trimmed.to_owned())
}

/// The fallback reply for a given turn counter.
pub fn fallback_reply(turn: u32) -> &'static str {
    let idx = usize::try_from(turn)
        .unwrap_or(0)
        .checked_rem(FALLBACK_REPLIES.len())
        .unwrap_or(0);
    FALLBACK_REPLIES.get(idx).copied().unwrap_or(GREETING_REPLY)
}

/// A randomly chosen low-commitment suspicion reply.
pub fn suspicion_reply() -> &'static str {
    SUSPICION_REPLIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(GREETING_REPLY)
}
