//! # pt-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the
//! ingestion/query services.

use axum::extract::{Path, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::Query;
use pt_core::{ImageView, UploadRequest};
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

/// Repeatable `objects` query parameter: `/images?objects=dog&objects=cat`.
#[derive(Debug, Default, Deserialize)]
pub struct ImageFilter {
    #[serde(default)]
    pub objects: Vec<String>,
}

/// Lists all images, or the union of images tagged with any of the given
/// object names when the filter is present.
pub async fn get_images(
    State(state): State<AppState>,
    Query(filter): Query<ImageFilter>,
) -> Result<Json<Vec<ImageView>>, ApiError> {
    let views = if filter.objects.is_empty() {
        state.query.list_all().await?
    } else {
        state.query.list_by_object_names(&filter.objects).await?
    };
    Ok(Json(views))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<Json<ImageView>, ApiError> {
    Ok(Json(state.query.get_by_id(&image_id).await?))
}

/// Accepts an `UploadRequest` body and runs the ingestion pipeline. The
/// caller's User-Agent header is forwarded for remote-link fetches.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UploadRequest>,
) -> Result<Json<ImageView>, ApiError> {
    let user_agent = headers.get(USER_AGENT).and_then(|value| value.to_str().ok());
    Ok(Json(state.ingest.submit(request, user_agent).await?))
}
