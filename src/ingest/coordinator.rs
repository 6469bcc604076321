use std::pin::pin;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::feed::FeedFetcher;
use crate::models::{truncate_chars, FeedConfig, FeedEntry, NewNewsItem, MAX_LINK_LEN};

use super::error::IngestError;
use super::keywords::{extract_keywords, KeywordSet};
use super::relevance::match_keywords;

/// Totals for one ingestion cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub committed: usize,
    pub feeds_processed: usize,
    pub feeds_failed: usize,
    pub duplicates_skipped: usize,
}

/// What happened to a single fetched entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Staged(NewNewsItem),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingFields,
    AlreadyStored,
    NotRelevant,
}

#[derive(Debug, Default)]
struct FeedReport {
    committed: usize,
    duplicates: usize,
}

/// Runs ingestion cycles over a fixed feed list.
///
/// Holds configuration and collaborators only; keywords are re-derived from
/// the alert table at the start of every cycle. Cycles are serialised by an
/// internal run-lock, so a manual trigger that arrives mid-cycle waits for
/// the running one to finish.
pub struct IngestionCoordinator {
    repository: Repository,
    fetcher: FeedFetcher,
    feeds: Vec<FeedConfig>,
    fetch_concurrency: usize,
    run_lock: Mutex<()>,
}

impl IngestionCoordinator {
    pub fn new(
        repository: Repository,
        fetcher: FeedFetcher,
        feeds: Vec<FeedConfig>,
        fetch_concurrency: usize,
    ) -> Self {
        Self {
            repository,
            fetcher,
            feeds,
            fetch_concurrency: fetch_concurrency.max(1),
            run_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config, repository: Repository) -> Result<Self> {
        let fetcher = FeedFetcher::new(config.request_timeout())?;
        Ok(Self::new(
            repository,
            fetcher,
            config.feeds.clone(),
            config.fetch_concurrency,
        ))
    }

    pub fn feeds(&self) -> &[FeedConfig] {
        &self.feeds
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// One full pass over the enabled feeds, in configured order.
    ///
    /// Fetches for upcoming feeds may be in flight while the current feed is
    /// written, but writes happen one feed at a time. A failing feed or entry
    /// never stops the rest of the cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();
        tracing::info!("Starting news ingestion cycle");

        let keywords = self.load_keywords().await;
        if keywords.is_empty() {
            tracing::info!("No active alert keywords found, skipping news processing");
            return CycleReport::default();
        }

        let enabled: Vec<FeedConfig> = self.feeds.iter().filter(|f| f.enabled).cloned().collect();

        let mut report = CycleReport::default();
        let mut fetches = pin!(stream::iter(enabled)
            .map(|feed| {
                let fetcher = self.fetcher.clone();
                async move {
                    let fetched = fetcher.fetch_entries(&feed.url).await;
                    (feed, fetched)
                }
            })
            .buffered(self.fetch_concurrency));

        while let Some((feed, fetched)) = fetches.next().await {
            match self.process_feed(&feed, fetched, &keywords).await {
                Ok(feed_report) => {
                    report.feeds_processed += 1;
                    report.committed += feed_report.committed;
                    report.duplicates_skipped += feed_report.duplicates;
                }
                Err(e) => {
                    report.feeds_failed += 1;
                    tracing::error!(feed = %feed.name, "{}", e);
                }
            }
        }

        tracing::info!(
            committed = report.committed,
            feeds_processed = report.feeds_processed,
            feeds_failed = report.feeds_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "News ingestion cycle complete. Total items committed: {}",
            report.committed
        );

        report
    }

    async fn load_keywords(&self) -> KeywordSet {
        match self.repository.active_alerts().await {
            Ok(alerts) => {
                let keywords = extract_keywords(&alerts);
                tracing::info!(
                    "Found {} keywords from {} alerts",
                    keywords.len(),
                    alerts.len()
                );
                keywords
            }
            Err(e) => {
                tracing::error!("{}", IngestError::KeywordQuery(e));
                KeywordSet::new()
            }
        }
    }

    async fn process_feed(
        &self,
        feed: &FeedConfig,
        fetched: Result<Vec<FeedEntry>>,
        keywords: &KeywordSet,
    ) -> std::result::Result<FeedReport, IngestError> {
        let entries = fetched.map_err(|source| IngestError::Fetch {
            feed: feed.name.clone(),
            source,
        })?;

        if entries.is_empty() {
            tracing::warn!("No entries found for feed: {}", feed.name);
            return Ok(FeedReport::default());
        }

        tracing::debug!("Processing {} entries from {}", entries.len(), feed.name);

        let mut staged = Vec::new();
        for entry in &entries {
            match self.evaluate_entry(feed, entry, keywords).await {
                Ok(EntryOutcome::Staged(item)) => staged.push(item),
                Ok(EntryOutcome::Skipped(reason)) => {
                    tracing::trace!(
                        feed = %feed.name,
                        link = ?entry.link,
                        ?reason,
                        "Entry skipped"
                    );
                }
                Err(e) => {
                    tracing::warn!(feed = %feed.name, title = ?entry.title, "{}", e);
                }
            }
        }

        if staged.is_empty() {
            tracing::debug!("No relevant entries in {}", feed.name);
            return Ok(FeedReport::default());
        }

        let batch = self
            .repository
            .insert_news_batch(staged)
            .await
            .map_err(|source| IngestError::Commit {
                feed: feed.name.clone(),
                source,
            })?;

        for link in batch.duplicates.iter().cloned() {
            tracing::debug!(feed = %feed.name, "{}", IngestError::Duplicate { link });
        }

        tracing::info!(
            "Successfully processed {} news items from {}",
            batch.inserted.len(),
            feed.name
        );

        Ok(FeedReport {
            committed: batch.inserted.len(),
            duplicates: batch.duplicates.len(),
        })
    }

    async fn evaluate_entry(
        &self,
        feed: &FeedConfig,
        entry: &FeedEntry,
        keywords: &KeywordSet,
    ) -> std::result::Result<EntryOutcome, IngestError> {
        let (Some(title), Some(link)) = (entry.title.as_deref(), entry.link.as_deref()) else {
            return Ok(EntryOutcome::Skipped(SkipReason::MissingFields));
        };

        // Stored links are truncated, so look up the truncated form.
        let stored_link = truncate_chars(link, MAX_LINK_LEN);
        let exists = self
            .repository
            .news_link_exists(&stored_link)
            .await
            .map_err(|source| IngestError::Lookup {
                link: stored_link.clone(),
                source,
            })?;
        if exists {
            return Ok(EntryOutcome::Skipped(SkipReason::AlreadyStored));
        }

        let matched = match_keywords(title, entry.description.as_deref(), keywords);
        if matched.is_empty() {
            return Ok(EntryOutcome::Skipped(SkipReason::NotRelevant));
        }

        tracing::info!(
            "Staged news: {}... (matched: {:?})",
            truncate_chars(title, 100),
            matched
        );

        Ok(EntryOutcome::Staged(NewNewsItem::new(
            &feed.name,
            title,
            entry.description.as_deref(),
            link,
            entry.published_at,
            &matched,
        )))
    }
}
