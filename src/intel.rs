//! Intelligence extraction from correspondent messages.
//!
//! [`Extractor::extract`] scans one message and folds every identifier it
//! finds into the session's [`Evidence`] record. Extraction order is fixed
//! and load-bearing: emails are captured before payment handles so a
//! handle-shaped fragment of an email is not double-counted, and phone
//! numbers are captured before account-shaped digit runs so a phone never
//! also lands in the account set. Repeated extraction over the same text
//! is a no-op.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::patterns::{PatternLibrary, SCAM_KEYWORDS};

/// Accumulated identifiers for one session.
///
/// Each set is an insertion-ordered, duplicate-free `Vec` so report
/// output stays deterministic. Sets only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// UPI-style `token@token` payment handles.
    pub payment_handles: Vec<String>,
    /// Phone numbers, normalized and (when different) original form.
    pub phone_numbers: Vec<String>,
    /// Bank-account-shaped 10–18 digit runs.
    pub bank_accounts: Vec<String>,
    /// URLs shared by the correspondent.
    pub phishing_links: Vec<String>,
    /// Full email addresses.
    pub email_addresses: Vec<String>,
    /// Scam keywords that have appeared so far.
    pub suspicious_keywords: Vec<String>,
}

impl Evidence {
    /// Total count of extracted identifiers (keywords excluded).
    pub fn identifier_count(&self) -> usize {
        self.payment_handles
            .len()
            .saturating_add(self.phone_numbers.len())
            .saturating_add(self.bank_accounts.len())
            .saturating_add(self.phishing_links.len())
            .saturating_add(self.email_addresses.len())
    }

    /// Names of the identifier categories that are still empty.
    ///
    /// Feeds the phase directive so each reply targets what is still
    /// unknown about the correspondent.
    pub fn missing_categories(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.phone_numbers.is_empty() {
            missing.push("phone number");
        }
        if self.payment_handles.is_empty() {
            missing.push("payment handle");
        }
        if self.email_addresses.is_empty() {
            missing.push("email address");
        }
        if self.phishing_links.is_empty() {
            missing.push("website link");
        }
        if self.bank_accounts.is_empty() {
            missing.push("bank account number");
        }
        missing
    }
}

/// Insert into an ordered set, preserving first-seen order.
fn insert_unique(set: &mut Vec<String>, value: &str) -> bool {
    if set.iter().any(|v| v == value) {
        return false;
    }
    set.push(value.to_owned());
    true
}

/// Keep only ASCII digits.
fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// The last ten digits of a digit string (or the whole string if shorter).
fn last_ten(digits: &str) -> &str {
    let start = digits.len().saturating_sub(10);
    digits.get(start..).unwrap_or(digits)
}

/// Regex-driven identifier extractor.
///
/// Holds the shared [`PatternLibrary`]; stateless otherwise.
#[derive(Debug, Clone)]
pub struct Extractor {
    patterns: Arc<PatternLibrary>,
}

impl Extractor {
    /// Create an extractor over the shared pattern library.
    pub fn new(patterns: Arc<PatternLibrary>) -> Self {
        Self { patterns }
    }

    /// Scan `text` and fold findings into `evidence`. Idempotent.
    pub fn extract(&self, text: &str, evidence: &mut Evidence) {
        // 1. Emails first, so the handle pass can skip their fragments.
        for m in self.patterns.email.find_iter(text) {
            if insert_unique(&mut evidence.email_addresses, m.as_str()) {
                info!(email = m.as_str(), "extracted email address");
            }
        }

        // 2. Payment handles, unless already inside a captured email.
        for m in self.patterns.payment_handle.find_iter(text) {
            let handle = m.as_str();
            let is_email_fragment = evidence
                .email_addresses
                .iter()
                .any(|email| email.contains(handle));
            if !is_email_fragment && insert_unique(&mut evidence.payment_handles, handle) {
                info!(handle, "extracted payment handle");
            }
        }

        // 3. Phone numbers: normalized form always, original form too when
        // the correspondent used separators.
        for m in self.patterns.phone.find_iter(text) {
            let original = m.as_str().trim();
            let normalized: String = original
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect();
            if insert_unique(&mut evidence.phone_numbers, &normalized) {
                info!(phone = %normalized, "extracted phone number");
            }
            if original != normalized && insert_unique(&mut evidence.phone_numbers, original) {
                info!(phone = original, "extracted phone number (original format)");
            }
        }

        // 4. URLs with trailing punctuation stripped.
        for m in self.patterns.url.find_iter(text) {
            let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
            if insert_unique(&mut evidence.phishing_links, url) {
                info!(url, "extracted url");
            }
        }

        // 5. Account-shaped digit runs, excluding anything already known
        // as a phone number (full digits or last-ten suffix).
        let phone_digits: HashSet<String> = evidence
            .phone_numbers
            .iter()
            .flat_map(|p| {
                let digits = digits_only(p);
                let suffix = last_ten(&digits).to_owned();
                [digits, suffix]
            })
            .collect();
        for m in self.patterns.account.find_iter(text) {
            let run = m.as_str();
            let is_phone = phone_digits.contains(run) || phone_digits.contains(last_ten(run));
            if !is_phone && insert_unique(&mut evidence.bank_accounts, run) {
                info!(account = run, "extracted account number");
            }
        }

        // 6. Keyword sweep.
        let lower = text.to_lowercase();
        for kw in SCAM_KEYWORDS {
            if lower.contains(kw) {
                insert_unique(&mut evidence.suspicious_keywords, kw);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(Arc::new(PatternLibrary::new().expect("patterns compile")))
    }

    #[test]
    fn test_extract_is_idempotent() {
        let ex = extractor();
        let text = "Pay to scam@fakebank or call +91 98765-43210, see http://fake.example/pay.";
        let mut evidence = Evidence::default();
        ex.extract(text, &mut evidence);
        let snapshot = evidence.clone();
        ex.extract(text, &mut evidence);
        ex.extract(text, &mut evidence);
        assert_eq!(evidence, snapshot, "repeat extraction must not grow any set");
    }

    #[test]
    fn test_handle_and_phone_scenario() {
        let ex = extractor();
        let mut evidence = Evidence::default();
        ex.extract("pay to scam@fakebank or call 9876543210", &mut evidence);
        assert_eq!(evidence.payment_handles, vec!["scam@fakebank"]);
        assert_eq!(evidence.phone_numbers, vec!["9876543210"]);
        assert!(
            evidence.bank_accounts.is_empty(),
            "phone digits must not be recorded as an account"
        );
    }

    #[test]
    fn test_email_fragment_not_counted_as_handle() {
        let ex = extractor();
        let mut evidence = Evidence::default();
        ex.extract("write to refunds@fakebank.example for your claim", &mut evidence);
        assert_eq!(evidence.email_addresses, vec!["refunds@fakebank.example"]);
        assert!(
            evidence.payment_handles.is_empty(),
            "handle-shaped email fragment must be skipped, got {:?}",
            evidence.payment_handles
        );
    }

    #[test]
    fn test_phone_stored_in_both_formats() {
        let ex = extractor();
        let mut evidence = Evidence::default();
        ex.extract("call me on +91 9876543210", &mut evidence);
        assert!(evidence.phone_numbers.contains(&"+919876543210".to_owned()));
        assert!(evidence.phone_numbers.contains(&"+91 9876543210".to_owned()));
    }

    #[test]
    fn test_account_excluded_by_phone_suffix() {
        let ex = extractor();
        let mut evidence = Evidence::default();
        // Phone first; the same 12-digit run ending in those ten digits
        // must still be excluded via the last-ten rule.
        ex.extract("call +91 9876543210", &mut evidence);
        ex.extract("account 919876543210", &mut evidence);
        assert!(
            evidence.bank_accounts.is_empty(),
            "digit run matching phone digits must be excluded: {:?}",
            evidence.bank_accounts
        );
    }

    #[test]
    fn test_account_with_country_prefix_excluded_by_its_suffix() {
        let ex = extractor();
        let mut evidence = Evidence::default();
        // Bare phone first; a longer run ending in the same ten digits is
        // still the phone, not an account.
        ex.extract("call 9876543210", &mut evidence);
        ex.extract("confirm 919876543210 is yours", &mut evidence);
        assert!(
            evidence.bank_accounts.is_empty(),
            "prefixed phone digits must be excluded: {:?}",
            evidence.bank_accounts
        );
    }

    #[test]
    fn test_genuine_account_number_is_kept() {
        let ex = extractor();
        let mut evidence = Evidence::default();
        ex.extract("transfer to account 123456789012345", &mut evidence);
        assert_eq!(evidence.bank_accounts, vec!["123456789012345"]);
    }

    #[test]
    fn test_url_trailing_punctuation_stripped() {
        let ex = extractor();
        let mut evidence = Evidence::default();
        ex.extract("click http://verify.example/kyc, now!", &mut evidence);
        assert_eq!(evidence.phishing_links, vec!["http://verify.example/kyc"]);
    }

    #[test]
    fn test_keyword_sweep_accumulates() {
        let ex = extractor();
        let mut evidence = Evidence::default();
        ex.extract("your account is blocked", &mut evidence);
        ex.extract("pay the processing fee for your lottery prize", &mut evidence);
        assert!(evidence.suspicious_keywords.contains(&"account".to_owned()));
        assert!(evidence.suspicious_keywords.contains(&"blocked".to_owned()));
        assert!(evidence.suspicious_keywords.contains(&"lottery".to_owned()));
        assert!(evidence.suspicious_keywords.contains(&"prize".to_owned()));
    }

    #[test]
    fn test_missing_categories_shrink_as_evidence_grows() {
        let ex = extractor();
        let mut evidence = Evidence::default();
        assert_eq!(evidence.missing_categories().len(), 5);
        ex.extract("call 9876543210", &mut evidence);
        let missing = evidence.missing_categories();
        assert!(!missing.contains(&"phone number"));
        assert_eq!(missing.len(), 4);
    }

    #[test]
    fn test_evidence_serializes_with_camel_case_keys() {
        let mut evidence = Evidence::default();
        evidence.payment_handles.push("scam@fakebank".to_owned());
        let json = serde_json::to_value(&evidence).expect("serializes");
        assert!(json.get("paymentHandles").is_some());
        assert!(json.get("phoneNumbers").is_some());
        assert!(json.get("bankAccounts").is_some());
        assert!(json.get("phishingLinks").is_some());
        assert!(json.get("emailAddresses").is_some());
        assert!(json.get("suspiciousKeywords").is_some());
    }
}
