use thiserror::Error;

use crate::error::AppError;

/// Failures inside an ingestion cycle. None of them abort the cycle; each is
/// logged at the scope it occurred in.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to load alert keywords: {0}")]
    KeywordQuery(#[source] AppError),

    #[error("failed to fetch feed '{feed}': {source}")]
    Fetch { feed: String, source: AppError },

    #[error("failed to look up '{link}': {source}")]
    Lookup { link: String, source: AppError },

    #[error("duplicate news item link '{link}'")]
    Duplicate { link: String },

    #[error("failed to commit batch for feed '{feed}': {source}")]
    Commit { feed: String, source: AppError },
}
