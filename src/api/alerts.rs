use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::{page_number, Alert, AlertFilter, AlertUpdate, NewAlert};

#[derive(Debug, Serialize, Deserialize)]
pub struct AlertListResponse {
    pub alerts: Vec<Alert>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

pub async fn create_alert(
    State(state): State<AppState>,
    Json(request): Json<NewAlert>,
) -> Result<(StatusCode, Json<Alert>)> {
    request.validate()?;
    let alert = state.repository.create_alert(request).await?;
    tracing::info!(alert_id = alert.id, symbol = %alert.symbol, "Alert created");
    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> Result<Json<AlertListResponse>> {
    let (skip, limit) = (filter.skip, filter.limit);
    let (alerts, total) = state.repository.list_alerts(filter).await?;
    Ok(Json(AlertListResponse {
        alerts,
        total,
        page: page_number(skip, limit),
        page_size: limit,
    }))
}

pub async fn get_alert(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Alert>> {
    state
        .repository
        .get_alert(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Alert"))
}

pub async fn update_alert(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AlertUpdate>,
) -> Result<Json<Alert>> {
    request.validate()?;
    state
        .repository
        .update_alert(id, request)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Alert"))
}

pub async fn delete_alert(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if state.repository.delete_alert(id).await? {
        tracing::info!(alert_id = id, "Alert deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Alert"))
    }
}
