use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::response::ApiResponse;

/// Health check endpoint to verify API status
pub async fn health_check() -> (StatusCode, Json<ApiResponse<Value>>) {
    (
        StatusCode::OK,
        ApiResponse::success(
            "Healthy!",
            json!({ "status": "ok", "timestamp": chrono::Utc::now() }),
        ),
    )
}
