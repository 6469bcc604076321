use std::time::Duration;

use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;

use crate::error::Result;
use crate::models::FeedEntry;

const USER_AGENT: &str = concat!("ticker-news/", env!("CARGO_PKG_VERSION"));

/// Fetches and parses one feed at a time. No retries: the next scheduled
/// cycle is the retry.
#[derive(Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..])?;

        Ok(feed.entries.into_iter().map(entry_from_feed).collect())
    }
}

fn entry_from_feed(entry: Entry) -> FeedEntry {
    // RSS <description> and Atom <summary> land in `summary`; fall back to
    // the content body for feeds that only ship full content.
    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body));

    FeedEntry {
        title: entry.title.map(|t| t.content).and_then(non_blank),
        link: entry
            .links
            .into_iter()
            .next()
            .map(|l| l.href)
            .and_then(non_blank),
        description,
        published_at: entry.published.or(entry.updated),
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
