use axum::Json;
use axum::response::IntoResponse;

use codedrop_core::schemas::HealthResponse;

/// `GET /health` -- liveness probe.
///
/// Startup already verified the database and cache are reachable; this
/// endpoint only reports that the process is serving.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_owned(),
        db: "connected".to_owned(),
    })
}
