use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_LEN: usize = 500;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_LINK_LEN: usize = 500;

/// A stored news item. Only entries that matched at least one alert keyword
/// ever become rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    #[serde(rename = "published_date")]
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
    pub keywords_matched: String,
    pub is_relevant: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNewsItem {
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
    pub keywords_matched: String,
}

impl NewNewsItem {
    /// Builds a row from a matched entry, truncating text columns to their
    /// maximum lengths.
    pub fn new(
        source: &str,
        title: &str,
        description: Option<&str>,
        link: &str,
        published_at: Option<DateTime<Utc>>,
        matched: &[String],
    ) -> Self {
        Self {
            title: truncate_chars(title, MAX_TITLE_LEN),
            description: description
                .filter(|d| !d.is_empty())
                .map(|d| truncate_chars(d, MAX_DESCRIPTION_LEN)),
            link: truncate_chars(link, MAX_LINK_LEN),
            published_at,
            source: source.to_string(),
            keywords_matched: matched.join(","),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsFilter {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_news_limit")]
    pub limit: u32,
    pub source: Option<String>,
    /// Comma-separated; every keyword must appear in `keywords_matched`.
    pub keywords: Option<String>,
}

fn default_news_limit() -> u32 {
    20
}

impl Default for NewsFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_news_limit(),
            source: None,
            keywords: None,
        }
    }
}

impl NewsFilter {
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|k| k.trim().to_uppercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCount {
    pub name: String,
    pub count: i64,
}

/// Truncates to at most `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
