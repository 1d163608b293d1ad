// HTTP request handlers
use crate::domain::dashboard::DashboardView;
use crate::domain::error::MultiplugError;
use crate::domain::reading::{parse_number, RawReading};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rate: Option<Value>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current dashboard view
pub async fn get_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardView>, MultiplugError> {
    Ok(Json(state.dashboard_service.project().await?))
}

/// Ingest one reading from a device
pub async fn post_data(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RawReading>, JsonRejection>,
) -> Result<Json<Value>, MultiplugError> {
    let Json(raw) = payload.map_err(|e| MultiplugError::validation(e.body_text()))?;

    state.ingest_service.ingest(&raw).await?;
    Ok(Json(json!({ "success": true })))
}

/// Clear today's daily buckets
pub async fn reset_daily(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, MultiplugError> {
    let cleared = state.admin_service.reset_today().await?;
    Ok(Json(json!({ "success": true, "cleared": cleared })))
}

/// Update the electricity rate
pub async fn update_rate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RateRequest>, JsonRejection>,
) -> Result<Json<Value>, MultiplugError> {
    let Json(request) = payload.map_err(|e| MultiplugError::validation(e.body_text()))?;
    let rate = request
        .rate
        .ok_or_else(|| MultiplugError::validation("Missing required fields"))?;
    let rate = parse_number("rate", &rate)?;

    state.admin_service.update_rate(rate).await?;
    Ok(Json(json!({ "success": true, "rate": rate })))
}
