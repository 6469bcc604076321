use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured syndication source. Lives in the config file, not the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl FeedConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
        }
    }
}

pub fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig::new(
            "Yahoo Finance",
            "https://feeds.finance.yahoo.com/rss/2.0/headline",
        ),
        FeedConfig::new(
            "MarketWatch",
            "https://feeds.marketwatch.com/marketwatch/marketpulse/",
        ),
        FeedConfig::new(
            "Reuters Business",
            "https://www.reutersagency.com/feed/?best-topics=business-finance&post_type=best",
        ),
    ]
}

/// One entry of a fetched feed. Title and link are trimmed and `None` when
/// blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}
