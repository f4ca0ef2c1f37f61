use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;

use codedrop_core::DropId;
use codedrop_core::schemas::{
    ChunkUploadResponse, CreateDropRequest, CreateDropResponse, GetDropMetadataResponse,
};

use super::AppState;
use super::error::ApiError;

/// `POST /api/v1/drop` -- open an upload session.
#[utoipa::path(
    post,
    path = "/api/v1/drop",
    tag = "Drops",
    summary = "Create a drop",
    request_body = CreateDropRequest,
    responses(
        (status = 200, description = "Drop created", body = CreateDropResponse),
        (status = 400, description = "Malformed body, invalid duration, or duration over 24h"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn create_drop(
    State(state): State<AppState>,
    payload: Result<Json<CreateDropRequest>, JsonRejection>,
) -> Result<Json<CreateDropResponse>, ApiError> {
    let Json(req) =
        payload.map_err(|e| ApiError::bad_request(format!("invalid JSON payload: {e}")))?;

    let (drop_id, expires_at) = state.service.create_drop(req).await?;
    Ok(Json(CreateDropResponse {
        drop_id: drop_id.to_string(),
        expires_at,
    }))
}

/// `POST /api/v1/drop/{id}/chunk` -- store one ciphertext chunk.
///
/// The chunk position arrives in the `X-Chunk-Index` header because the
/// body is raw binary.
#[utoipa::path(
    post,
    path = "/api/v1/drop/{id}/chunk",
    tag = "Drops",
    summary = "Upload a chunk",
    params(
        ("id" = String, Path, description = "Drop id"),
        ("X-Chunk-Index" = i32, Header, description = "Zero-based chunk position")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Chunk stored", body = ChunkUploadResponse),
        (status = 400, description = "Missing or invalid X-Chunk-Index header"),
        (status = 413, description = "Chunk exceeds the 5 MiB limit"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn upload_chunk(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ChunkUploadResponse>), ApiError> {
    let chunk_index = headers
        .get("x-chunk-index")
        .ok_or_else(|| ApiError::bad_request("missing X-Chunk-Index header"))?
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .ok_or_else(|| ApiError::bad_request("X-Chunk-Index is not a valid integer"))?;

    let drop_id = DropId::from(id);
    let hash = state
        .service
        .upload_chunk(&drop_id, chunk_index, &body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ChunkUploadResponse {
            status: "uploaded".to_owned(),
            hash,
        }),
    ))
}

/// `GET /api/v1/drop/{id}` -- fetch drop metadata.
///
/// Side effect: consumes one admission slot. Receivers call this exactly
/// once before streaming chunks.
#[utoipa::path(
    get,
    path = "/api/v1/drop/{id}",
    tag = "Drops",
    summary = "Fetch drop metadata (consumes one download slot)",
    params(("id" = String, Path, description = "Drop id")),
    responses(
        (status = 200, description = "Drop metadata", body = GetDropMetadataResponse),
        (status = 404, description = "Unknown drop"),
        (status = 410, description = "Drop expired or download limit reached"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn get_drop_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GetDropMetadataResponse>, ApiError> {
    let drop_id = DropId::from(id);
    let meta = state.service.get_metadata(&drop_id).await?;
    Ok(Json(GetDropMetadataResponse {
        file_name: meta.file_name,
        file_size: meta.file_size,
        encryption_salt: meta.encryption_salt,
        chunk_count: meta.chunk_count,
    }))
}

/// `GET /api/v1/drop/{id}/chunk/{chunk_index}` -- fetch one ciphertext chunk.
#[utoipa::path(
    get,
    path = "/api/v1/drop/{id}/chunk/{chunk_index}",
    tag = "Drops",
    summary = "Download a chunk",
    params(
        ("id" = String, Path, description = "Drop id"),
        ("chunk_index" = i32, Path, description = "Zero-based chunk position")
    ),
    responses(
        (status = 200, description = "Ciphertext chunk", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "Unknown drop or chunk"),
        (status = 500, description = "Backend failure or integrity check failure")
    )
)]
pub async fn download_chunk(
    State(state): State<AppState>,
    Path((id, chunk_index)): Path<(String, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let drop_id = DropId::from(id);
    let body = state.service.download_chunk(&drop_id, chunk_index).await?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    ))
}
