mod fetcher;
mod opml;

pub use self::fetcher::FeedFetcher;
pub use self::opml::{parse_opml, parse_opml_file};
