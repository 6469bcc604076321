//! Shared fixtures: a temp-file database and a wiremock server serving RSS.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use ticker_news::db::Repository;
use ticker_news::feed::FeedFetcher;
use ticker_news::ingest::IngestionCoordinator;
use ticker_news::models::{FeedConfig, NewAlert};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestItem<'a> {
    pub title: Option<&'a str>,
    pub link: Option<&'a str>,
    pub description: Option<&'a str>,
}

pub fn item<'a>(title: &'a str, link: &'a str, description: Option<&'a str>) -> TestItem<'a> {
    TestItem {
        title: Some(title),
        link: Some(link),
        description,
    }
}

pub fn rss(items: &[TestItem<'_>]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test Feed</title><link>https://example.com</link>"#,
    );
    body.push_str("<description>Test</description>");
    for item in items {
        body.push_str("<item>");
        if let Some(title) = item.title {
            body.push_str(&format!("<title>{}</title>", title));
        }
        if let Some(link) = item.link {
            body.push_str(&format!("<link>{}</link>", link));
        }
        if let Some(description) = item.description {
            body.push_str(&format!("<description>{}</description>", description));
        }
        body.push_str("</item>");
    }
    body.push_str("</channel></rss>");
    body
}

pub async fn mount_feed(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/rss+xml"))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub fn alert(symbol: &str, message: Option<&str>, is_active: bool) -> NewAlert {
    NewAlert {
        symbol: symbol.to_string(),
        alert_type: "news".to_string(),
        condition: "contains".to_string(),
        threshold_value: None,
        message: message.map(str::to_string),
        is_active,
    }
}

pub struct TestContext {
    _dir: TempDir,
    pub db_path: PathBuf,
    pub repository: Repository,
    pub feeds: MockServer,
}

impl TestContext {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_path = dir.path().join("news.db");
        let repository = Repository::new(db_path.to_str().expect("utf-8 path"))
            .await
            .expect("open database");
        let feeds = MockServer::start().await;

        Self {
            _dir: dir,
            db_path,
            repository,
            feeds,
        }
    }

    pub fn feed(&self, name: &str, route: &str) -> FeedConfig {
        FeedConfig::new(name, format!("{}{}", self.feeds.uri(), route))
    }

    /// A second, plain connection to the same database file.
    pub fn raw_connection(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(&self.db_path).expect("open raw connection")
    }

    pub fn coordinator(&self, feeds: Vec<FeedConfig>) -> Arc<IngestionCoordinator> {
        let fetcher = FeedFetcher::new(Duration::from_secs(5)).expect("http client");
        Arc::new(IngestionCoordinator::new(
            self.repository.clone(),
            fetcher,
            feeds,
            3,
        ))
    }
}
