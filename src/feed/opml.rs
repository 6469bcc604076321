use std::fs::File;
use std::path::Path;

use opml::{Outline, OPML};

use crate::error::Result;
use crate::models::FeedConfig;

/// Reads feed subscriptions from an OPML export. Nested folders are flattened.
pub fn parse_opml_file(path: &Path) -> Result<Vec<FeedConfig>> {
    let mut file = File::open(path)?;
    let document = OPML::from_reader(&mut file)?;
    Ok(collect_feeds(&document.body.outlines))
}

pub fn parse_opml(content: &str) -> Result<Vec<FeedConfig>> {
    let document = OPML::from_str(content)?;
    Ok(collect_feeds(&document.body.outlines))
}

fn collect_feeds(outlines: &[Outline]) -> Vec<FeedConfig> {
    let mut feeds = Vec::new();
    for outline in outlines {
        if let Some(url) = outline.xml_url.as_deref().filter(|u| !u.is_empty()) {
            let name = outline
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| outline.text.clone());
            feeds.push(FeedConfig::new(name, url));
        }
        feeds.extend(collect_feeds(&outline.outlines));
    }
    feeds
}
