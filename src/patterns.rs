//! Shared pattern library: compiled identifier matchers and static tables.
//!
//! One [`PatternLibrary`] instance is built at engine startup and shared
//! (via `Arc`) by the detector, the extractor, and the classifier so that
//! every component sees exactly the same matchers. Nothing here holds
//! mutable state.

use anyhow::{Context, Result};
use regex::Regex;

/// Vocabulary that marks a message as likely scam content.
///
/// Grouped loosely: banking/finance pressure, lottery/prize bait,
/// legal threats, and too-good offers. Matching is substring-based on
/// the lowercased message.
pub const SCAM_KEYWORDS: &[&str] = &[
    // Banking / finance
    "urgent", "blocked", "suspended", "verify", "otp", "kyc", "pan",
    "aadhaar", "account", "bank", "upi", "transfer", "payment",
    "immediately", "click", "link", "update", "expire", "freeze",
    "locked", "compromised", "share", "identity", "security",
    "prevent", "suspension", "digit", "minutes", "hours",
    // Lottery / prize
    "lottery", "prize", "winner", "won", "congratulations", "claim",
    "lakh", "crore", "rupees", "jackpot", "lucky", "draw",
    // Threats
    "police", "arrest", "court", "legal", "case", "crime", "fraud",
    // Offers
    "refund", "cashback", "reward", "bonus", "offer", "limited",
];

/// A named social-engineering category with its trigger phrases.
#[derive(Debug, Clone, Copy)]
pub struct RedFlagCategory {
    /// Stable machine identifier.
    pub id: &'static str,
    /// Human-readable label reported to investigators.
    pub label: &'static str,
    /// Lowercase substrings that mark this category.
    pub triggers: &'static [&'static str],
}

/// The full red-flag category table.
///
/// Order is stable; cumulative session flags preserve first-seen order
/// so reports stay deterministic.
pub const RED_FLAG_CATEGORIES: &[RedFlagCategory] = &[
    RedFlagCategory {
        id: "URGENCY_PRESSURE",
        label: "Urgency / pressure tactics",
        triggers: &[
            "urgent", "immediately", "act now", "expire", "last chance",
            "right now", "act fast", "hurry", "quick", "limited time",
            "within minutes", "within hours", "today only", "don't delay",
            "minutes", "hours", "seconds",
        ],
    },
    RedFlagCategory {
        id: "AUTHORITY_IMPERSONATION",
        label: "Impersonation of authority / institution",
        triggers: &[
            "bank", "rbi", "sbi", "government", "police", "court",
            "reserve bank", "income tax", "sebi", "customs", "telecom",
            "officer", "manager", "department", "ministry", "aadhaar",
        ],
    },
    RedFlagCategory {
        id: "FINANCIAL_REQUEST",
        label: "Request for money / financial transaction",
        triggers: &[
            "send money", "transfer", "pay", "upi", "payment",
            "processing fee", "registration fee", "advance amount",
            "deposit", "invest", "amount", "rupees", "rs.",
        ],
    },
    RedFlagCategory {
        id: "PERSONAL_INFO_REQUEST",
        label: "Request for sensitive personal information",
        triggers: &[
            "otp", "password", "pin", "cvv", "card number",
            "aadhaar", "pan", "kyc", "verify identity", "share details",
            "bank details", "account number", "login", "credentials",
        ],
    },
    RedFlagCategory {
        id: "TOO_GOOD_TO_BE_TRUE",
        label: "Too-good-to-be-true offer",
        triggers: &[
            "lottery", "won", "prize", "congratulations", "winner",
            "guaranteed returns", "double", "triple", "jackpot",
            "lakh", "crore", "free", "lucky draw", "cashback", "reward",
        ],
    },
    RedFlagCategory {
        id: "THREATENING_LANGUAGE",
        label: "Threatening / fear-based language",
        triggers: &[
            "arrest", "court", "legal action", "case filed", "jail",
            "warrant", "crime", "fraud", "suspend", "block", "freeze",
            "locked", "compromised", "terminate", "penalty", "fine",
        ],
    },
    RedFlagCategory {
        id: "SUSPICIOUS_LINKS",
        label: "Contains suspicious links or redirects",
        triggers: &[
            "http://", "https://", "www.", "click here", "click link",
            ".xyz", ".tk", ".ml", "bit.ly", "tinyurl",
        ],
    },
    RedFlagCategory {
        id: "UPFRONT_PAYMENT",
        label: "Upfront payment required before benefit",
        triggers: &[
            "processing fee", "registration fee", "tax amount",
            "claim charge", "advance", "fee before", "pay to receive",
            "pay first", "token amount",
        ],
    },
    RedFlagCategory {
        id: "SECRECY_REQUEST",
        label: "Request for secrecy",
        triggers: &[
            "don't tell", "keep secret", "confidential", "private",
            "between us", "do not share", "alone",
        ],
    },
];

/// Compiled matchers for the five identifier shapes.
///
/// The field order mirrors extraction precedence: emails are matched
/// before payment handles so a handle-shaped fragment of an email is
/// never double-counted.
#[derive(Debug)]
pub struct PatternLibrary {
    /// Full email address with TLD.
    pub email: Regex,
    /// `token@token` payment handle (UPI-style).
    pub payment_handle: Regex,
    /// Phone number, bare 10 digits or with a `+NN` country code.
    pub phone: Regex,
    /// `http(s)://` or `www.` URL up to whitespace.
    pub url: Regex,
    /// 10–18 digit run (bank-account shaped).
    pub account: Regex,
}

impl PatternLibrary {
    /// Compile the matcher set.
    ///
    /// # Errors
    ///
    /// Returns an error if any built-in pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            email: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
                .context("email pattern")?,
            payment_handle: Regex::new(r"[A-Za-z0-9._-]+@[A-Za-z]+")
                .context("payment handle pattern")?,
            phone: Regex::new(r"\+\d{1,3}[\s-]?\d{10}\b|\b\d{10}\b").context("phone pattern")?,
            url: Regex::new(r"(?i)https?://[^\s]+|www\.[^\s]+").context("url pattern")?,
            account: Regex::new(r"\b\d{10,18}\b").context("account pattern")?,
        })
    }

    /// Count distinct scam keywords present in `text`.
    pub fn keyword_hits(&self, text: &str) -> usize {
        let lower = text.to_lowercase();
        SCAM_KEYWORDS.iter().filter(|kw| lower.contains(**kw)).count()
    }

    /// Count how many identifier types (of the five) match `text`.
    pub fn identifier_type_hits(&self, text: &str) -> usize {
        [
            &self.email,
            &self.payment_handle,
            &self.phone,
            &self.url,
            &self.account,
        ]
        .iter()
        .filter(|re| re.is_match(text))
        .count()
    }
}
