use axum::{http::StatusCode, response::IntoResponse, Json};
use shared::HealthResponse;

/// Unauthenticated liveness probe
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
