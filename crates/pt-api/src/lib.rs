//! # pt-api
//!
//! The web routing and orchestration layer for Pictag.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use pt_service::{ImageIngestService, ImageQueryService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// State shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<ImageIngestService>,
    pub query: Arc<ImageQueryService>,
}

/// Builds the application router.
///
/// # Developer Note
/// CORS is wide open for GET/POST, mirroring the service's use from a
/// local single-page app during development.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    Router::new()
        .route(
            "/images",
            get(handlers::get_images).post(handlers::upload_image),
        )
        .route("/images/{image_id}", get(handlers::get_image))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
