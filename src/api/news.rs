use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::{page_number, NewsFilter, NewsItem, SourceCount};

#[derive(Debug, Serialize, Deserialize)]
pub struct NewsListResponse {
    pub news_items: Vec<NewsItem>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceCount>,
}

pub async fn list_news(
    State(state): State<AppState>,
    Query(filter): Query<NewsFilter>,
) -> Result<Json<NewsListResponse>> {
    let (skip, limit) = (filter.skip, filter.limit);
    let (news_items, total) = state.repository.list_news(filter).await?;
    Ok(Json(NewsListResponse {
        news_items,
        total,
        page: page_number(skip, limit),
        page_size: limit,
    }))
}

pub async fn get_news_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NewsItem>> {
    state
        .repository
        .get_news_item(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("News item"))
}

/// Marks the item as not relevant instead of deleting the row.
pub async fn delete_news_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if state.repository.mark_news_irrelevant(id).await? {
        tracing::info!(news_id = id, "News item marked as not relevant");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("News item"))
    }
}

/// Kicks off an ingestion cycle in the background. Failures only show up in
/// the logs.
pub async fn trigger_fetch(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    state.scheduler.trigger();
    (
        StatusCode::ACCEPTED,
        Json(json!({ "message": "News fetch triggered successfully" })),
    )
}

pub async fn list_sources(State(state): State<AppState>) -> Result<Json<SourcesResponse>> {
    let sources = state.repository.news_sources().await?;
    Ok(Json(SourcesResponse { sources }))
}
