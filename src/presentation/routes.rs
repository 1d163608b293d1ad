// Router wiring
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_data, health_check, post_data, reset_daily, update_rate};
use crate::presentation::ws::ws_handler;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/data", get(get_data).post(post_data))
        .route("/api/reset-daily", post(reset_daily))
        .route("/api/settings/rate", post(update_rate))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
