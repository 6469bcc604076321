//! Stock alert service that polls RSS feeds and keeps the news items
//! matching keywords derived from active alerts.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod models;
pub mod services;

pub use error::{AppError, Result};
