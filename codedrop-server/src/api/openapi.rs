use utoipa::OpenApi;

use codedrop_core::schemas::{
    ChunkUploadResponse, CreateDropRequest, CreateDropResponse, GetDropMetadataResponse,
    HealthResponse, StatsResponse,
};

/// OpenAPI document for the v1 API, served at `/api-doc/openapi.json` and
/// browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CodeDrop API",
        description = "Ephemeral, end-to-end-encrypted file handoff. The server only ever sees ciphertext; decryption keys travel in URL fragments and are never transmitted."
    ),
    paths(
        crate::api::health::health,
        crate::api::drops::create_drop,
        crate::api::drops::upload_chunk,
        crate::api::drops::get_drop_metadata,
        crate::api::drops::download_chunk,
        crate::api::stats::stats,
    ),
    components(schemas(
        CreateDropRequest,
        CreateDropResponse,
        ChunkUploadResponse,
        GetDropMetadataResponse,
        StatsResponse,
        HealthResponse,
    )),
    tags(
        (name = "Drops", description = "Drop lifecycle and chunk transfer"),
        (name = "Stats", description = "Storage metrics"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
