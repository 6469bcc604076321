//! News ingestion pipeline: keyword derivation, per-feed fetch, relevance
//! filtering, de-duplication and per-feed commit.

mod coordinator;
mod error;
mod keywords;
mod relevance;

pub use coordinator::{CycleReport, EntryOutcome, IngestionCoordinator, SkipReason};
pub use error::IngestError;
pub use keywords::{extract_keywords, KeywordSet, STOP_WORDS};
pub use relevance::match_keywords;
