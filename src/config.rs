use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::{AppError, Result};
use crate::models::{default_feeds, FeedConfig};

const APP_DIR: &str = "ticker-news";
const CONFIG_ENV: &str = "TICKER_NEWS_CONFIG";
const DB_ENV: &str = "TICKER_NEWS_DB";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_fetch_interval")]
    pub fetch_interval_seconds: u64,

    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("news.db").to_string_lossy().to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_fetch_interval() -> u64 {
    600
}

fn default_fetch_concurrency() -> usize {
    3
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            fetch_interval_seconds: default_fetch_interval(),
            fetch_concurrency: default_fetch_concurrency(),
            request_timeout_seconds: default_request_timeout(),
            feeds: default_feeds(),
        }
    }
}

impl Config {
    /// Loads the config file and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;

        if let Ok(db_path) = std::env::var(DB_ENV) {
            config.db_path = db_path;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads the file as written, writing defaults first if it does not exist.
    /// Environment overrides are not applied.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Merges feeds into the config file at `config_path` and rewrites it.
    /// Returns how many feeds were new.
    pub fn import_feeds(config_path: &Path, feeds: Vec<FeedConfig>) -> Result<usize> {
        let mut config = Self::load_from(config_path)?;
        let added = config.merge_feeds(feeds);
        config.validate()?;
        config.save_to(config_path)?;
        Ok(added)
    }

    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_interval_seconds == 0 {
            return Err(AppError::Config(
                "fetch_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.fetch_concurrency == 0 {
            return Err(AppError::Config(
                "fetch_concurrency must be greater than 0".to_string(),
            ));
        }
        for feed in &self.feeds {
            let url = Url::parse(&feed.url).map_err(|e| {
                AppError::Config(format!("feed '{}' has an invalid url: {}", feed.name, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AppError::Config(format!(
                    "feed '{}' must use http or https",
                    feed.name
                )));
            }
        }
        Ok(())
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Adds feeds whose URL is not configured yet. Returns how many were added.
    pub fn merge_feeds(&mut self, feeds: Vec<FeedConfig>) -> usize {
        let mut added = 0;
        for feed in feeds {
            if self.feeds.iter().any(|f| f.url == feed.url) {
                continue;
            }
            self.feeds.push(feed);
            added += 1;
        }
        added
    }
}
