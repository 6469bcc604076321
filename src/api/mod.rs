//! HTTP surface: alert CRUD, news listing, manual fetch trigger.

mod alerts;
mod error;
mod news;

use std::time::Instant;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::db::Repository;
use crate::error::Result;
use crate::services::Scheduler;

#[derive(Clone)]
pub struct AppState {
    pub repository: Repository,
    pub scheduler: Scheduler,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(repository: Repository, scheduler: Scheduler) -> Self {
        Self {
            repository,
            scheduler,
            started_at: Instant::now(),
        }
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Ticker News API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route(
            "/api/alerts",
            get(alerts::list_alerts).post(alerts::create_alert),
        )
        .route(
            "/api/alerts/{id}",
            get(alerts::get_alert)
                .put(alerts::update_alert)
                .delete(alerts::delete_alert),
        )
        .route("/api/news", get(news::list_news))
        .route("/api/news/fetch", post(news::trigger_fetch))
        .route("/api/news/sources/list", get(news::list_sources))
        .route(
            "/api/news/{id}",
            get(news::get_news_item).delete(news::delete_news_item),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(
    bind_addr: &str,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
