use std::collections::BTreeSet;

use crate::models::Alert;

/// Message words that never become keywords.
pub const STOP_WORDS: [&str; 6] = ["alert", "price", "above", "below", "when", "stock"];

const MIN_WORD_LEN: usize = 4;

/// Upper-cased keywords derived from active alerts. Rebuilt every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet(BTreeSet<String>);

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keyword: impl Into<String>) -> bool {
        self.0.insert(keyword.into().to_uppercase())
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.0.contains(keyword)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = KeywordSet::new();
        for keyword in iter {
            set.insert(keyword);
        }
        set
    }
}

/// Symbols of active alerts plus the meaningful words of their messages.
///
/// Message words are split on whitespace only; punctuation stays attached.
/// Inactive alerts are ignored even if the caller passes them in.
pub fn extract_keywords(alerts: &[Alert]) -> KeywordSet {
    let mut keywords = KeywordSet::new();

    for alert in alerts.iter().filter(|a| a.is_active) {
        if !alert.symbol.is_empty() {
            keywords.insert(alert.symbol.as_str());
        }

        if let Some(message) = &alert.message {
            let lowered = message.to_lowercase();
            for word in lowered.split_whitespace() {
                if word.chars().count() >= MIN_WORD_LEN && !STOP_WORDS.contains(&word) {
                    keywords.insert(word);
                }
            }
        }
    }

    keywords
}
