//! Request and response bodies for the v1 HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/drop`, which opens an upload session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateDropRequest {
    /// Display name of the file. Untrusted; shown back to receivers.
    pub file_name: String,
    /// Original plaintext size in bytes. Informational only.
    pub file_size: i64,
    /// Opaque algorithm version tag (e.g. `"v1-aes-gcm"`). Not a secret.
    pub encryption_salt: String,
    /// Lifetime as a duration string, e.g. `"24h"` or `"30m"`. Capped at 24h.
    pub expires_in: String,
    /// How many metadata fetches this drop admits before it is gone.
    pub max_downloads: i32,
}

/// Body of a successful `POST /api/v1/drop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateDropResponse {
    /// Server-assigned drop identifier.
    pub drop_id: String,
    /// Absolute expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Body of a successful `POST /api/v1/drop/{id}/chunk`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChunkUploadResponse {
    pub status: String,
    /// Hex-encoded SHA-256 of the stored ciphertext.
    pub hash: String,
}

/// Body of a successful `GET /api/v1/drop/{id}`.
///
/// Fetching this consumes one admission slot; clients must fetch it exactly
/// once per download attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GetDropMetadataResponse {
    pub file_name: String,
    pub file_size: i64,
    pub encryption_salt: String,
    pub chunk_count: i64,
}

/// Body of `GET /api/v1/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatsResponse {
    /// Drops whose expiry is still in the future.
    pub active_drops: i64,
    /// Count of distinct ciphertext blobs.
    pub total_chunks: i64,
    /// Bytes physically stored (sum over distinct blobs).
    pub storage_used_bytes: i64,
    /// Bytes saved by deduplication relative to storing every chunk row.
    pub storage_saved_bytes: i64,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
}
