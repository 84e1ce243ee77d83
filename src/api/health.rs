//! Health check endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Current status of the service
    pub status: String,
    pub message: String,
    /// Version of the service
    pub version: String,
    /// "connected" or "disconnected"
    pub database: String,
}

fn database_label(connected: bool) -> String {
    if connected { "connected" } else { "disconnected" }.to_string()
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<crate::AppState>) -> Json<HealthResponse> {
    let connected = state.services.repository.ping().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Library catalog API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_label(connected),
    })
}

/// Readiness check endpoint (checks database connectivity)
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Database unavailable", body = HealthResponse)
    )
)]
pub async fn readiness_check(State(state): State<crate::AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connected = state.services.repository.ping().await;
    let (status, label) = if connected {
        (StatusCode::OK, "ready")
    } else {
        tracing::warn!("Readiness check failed: database unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            message: format!("Database {}", database_label(connected)),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database_label(connected),
        }),
    )
}
