pub mod drops;
pub mod error;
pub mod health;
pub mod openapi;
pub mod stats;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::service::{DropService, MAX_CHUNK_SIZE};

use self::openapi::ApiDoc;

/// Hard ceiling on request handling time, enforced at the edge.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The drop service instance.
    pub service: Arc<DropService>,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/drop", post(drops::create_drop))
        .route("/api/v1/drop/{id}", get(drops::get_drop_metadata))
        .route(
            "/api/v1/drop/{id}/chunk",
            post(drops::upload_chunk).layer(DefaultBodyLimit::max(MAX_CHUNK_SIZE)),
        )
        .route(
            "/api/v1/drop/{id}/chunk/{chunk_index}",
            get(drops::download_chunk),
        )
        .route("/api/v1/stats", get(stats::stats))
        .with_state(state)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}
