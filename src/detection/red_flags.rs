//! Red-flag tagging — names the social-engineering categories a message
//! exhibits.
//!
//! Stateless and total: every message maps to a (possibly empty) list of
//! category labels. The engagement controller unions each turn's result
//! into the session's cumulative set; labels are never removed.

use crate::patterns::RED_FLAG_CATEGORIES;

/// A category hit with the specific triggers that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedFlagMatch {
    /// Stable category identifier.
    pub category: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// The trigger phrases found in the message.
    pub matched_triggers: Vec<&'static str>,
}

/// Labels of every category whose triggers occur in `text`.
pub fn flags(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    RED_FLAG_CATEGORIES
        .iter()
        .filter(|cat| cat.triggers.iter().any(|t| lower.contains(t)))
        .map(|cat| cat.label)
        .collect()
}

/// Like [`flags`] but reports which triggers matched per category.
///
/// Used for agent notes and diagnostics, not for the reply path.
pub fn flags_detailed(text: &str) -> Vec<RedFlagMatch> {
    let lower = text.to_lowercase();
    RED_FLAG_CATEGORIES
        .iter()
        .filter_map(|cat| {
            let matched: Vec<&'static str> = cat
                .triggers
                .iter()
                .filter(|t| lower.contains(**t))
                .copied()
                .collect();
            if matched.is_empty() {
                None
            } else {
                Some(RedFlagMatch {
                    category: cat.id,
                    label: cat.label,
                    matched_triggers: matched,
                })
            }
        })
        .collect()
}
