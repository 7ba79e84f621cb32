//! Company Matcher
//!
//! Blocks a card when its whole normalized text contains a normalized
//! block-list entry. This deliberately over-matches: the displayed company
//! text frequently differs from whatever markup is labeled "company name"
//! (rebrands, recruiter blurbs, sponsor lines), and hiding one extra card is
//! cheaper than missing one.

use crate::config::BlockList;

/// Collapse whitespace runs to a single space, trim, and lower-case.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.to_lowercase()
}

/// Block list compiled into normalized, non-empty patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyMatcher {
    patterns: Vec<String>,
}

impl CompanyMatcher {
    pub fn new(block_list: &BlockList) -> Self {
        let mut patterns: Vec<String> = Vec::with_capacity(block_list.len());
        for entry in block_list.iter() {
            let pattern = normalize_text(entry);
            // A blank pattern would be a substring of every card.
            if pattern.is_empty() || patterns.contains(&pattern) {
                continue;
            }
            patterns.push(pattern);
        }
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Full-card strategy: the card's text contains a pattern.
    pub fn is_blocked(&self, card_text: &str) -> bool {
        self.matched_pattern(card_text).is_some()
    }

    /// The first pattern found in `card_text`.
    pub fn matched_pattern(&self, card_text: &str) -> Option<&str> {
        if self.patterns.is_empty() {
            return None;
        }
        let text = normalize_text(card_text);
        self.patterns
            .iter()
            .find(|pattern| text.contains(pattern.as_str()))
            .map(String::as_str)
    }

    /// Name strategy: either string contains the other, so "Acme" matches
    /// "Acme, Inc." and "Acme Corp LLC" matches "acme corp".
    pub fn matches_name(&self, company_name: &str) -> bool {
        let name = normalize_text(company_name);
        if name.is_empty() {
            return false;
        }
        self.patterns
            .iter()
            .any(|pattern| name.contains(pattern.as_str()) || pattern.contains(name.as_str()))
    }

    /// Prefer the full card text; fall back to an extracted name when no
    /// card text is available.
    pub fn matches(&self, card_text: Option<&str>, company_name: Option<&str>) -> bool {
        match (card_text, company_name) {
            (Some(text), _) => self.is_blocked(text),
            (None, Some(name)) => self.matches_name(name),
            (None, None) => false,
        }
    }
}
