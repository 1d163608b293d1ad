// Maps domain errors onto HTTP responses
use crate::domain::error::MultiplugError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

impl IntoResponse for MultiplugError {
    fn into_response(self) -> Response {
        let status = match &self {
            MultiplugError::Validation(_) => StatusCode::BAD_REQUEST,
            MultiplugError::Persistence(e) => {
                tracing::error!("Persistence error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            MultiplugError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
