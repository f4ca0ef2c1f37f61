use axum::Json;
use axum::extract::State;

use codedrop_core::schemas::StatsResponse;

use super::AppState;
use super::error::ApiError;

/// `GET /api/v1/stats` -- storage and deduplication metrics.
///
/// `storage_saved_bytes` above zero means content addressing is actively
/// collapsing duplicate chunks.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Stats",
    summary = "Storage statistics",
    responses(
        (status = 200, description = "Current storage metrics", body = StatsResponse),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.service.stats().await?;
    Ok(Json(StatsResponse {
        active_drops: stats.active_drops,
        total_chunks: stats.total_chunks,
        storage_used_bytes: stats.storage_used,
        storage_saved_bytes: stats.storage_saved,
    }))
}
