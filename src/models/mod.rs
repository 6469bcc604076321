mod alert;
mod feed;
mod news;

pub use alert::{Alert, AlertFilter, AlertUpdate, NewAlert};
pub use feed::{default_feeds, FeedConfig, FeedEntry};
pub use news::{
    truncate_chars, NewNewsItem, NewsFilter, NewsItem, SourceCount, MAX_DESCRIPTION_LEN,
    MAX_LINK_LEN, MAX_TITLE_LEN,
};

/// Page number reported alongside a `skip`/`limit` window.
pub fn page_number(skip: u32, limit: u32) -> u32 {
    if limit > 0 {
        skip / limit + 1
    } else {
        1
    }
}
