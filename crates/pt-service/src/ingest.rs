//! # Ingestion Pipeline
//!
//! Orchestrates one upload end to end: validate the request, materialize
//! the image bytes (embedded base64 or remote fetch), persist the record,
//! and optionally hand the bytes to the object detector, caching every
//! distinct detected name as an `ObjectTag` row.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use pt_core::{
    AppError, ImageRecord, ImageStore, ImageView, LinkFetcher, ObjectDetector, ObjectTag,
    ObjectTagStore, Result, UploadRequest,
};
use uuid::Uuid;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.127 Safari/537.36";

/// Tunables for the pipeline. The fetch timeout itself lives on the
/// injected `LinkFetcher` client.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Sent on remote-link fetches when the caller supplies no User-Agent
    pub default_user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            default_user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub struct ImageIngestService {
    images: Arc<dyn ImageStore>,
    tags: Arc<dyn ObjectTagStore>,
    detector: Arc<dyn ObjectDetector>,
    fetcher: Arc<dyn LinkFetcher>,
    config: IngestConfig,
}

impl ImageIngestService {
    pub fn new(
        images: Arc<dyn ImageStore>,
        tags: Arc<dyn ObjectTagStore>,
        detector: Arc<dyn ObjectDetector>,
        fetcher: Arc<dyn LinkFetcher>,
        config: IngestConfig,
    ) -> Self {
        Self {
            images,
            tags,
            detector,
            fetcher,
            config,
        }
    }

    /// Runs the full pipeline for one upload. `user_agent` is the caller's
    /// User-Agent header, forwarded to the remote fetch when set.
    pub async fn submit(
        &self,
        request: UploadRequest,
        user_agent: Option<&str>,
    ) -> Result<ImageView> {
        validate(&request)?;

        // validate() guarantees these are set
        let is_link = request.is_link.unwrap_or_default();
        let detect_objects = request.detect_objects.unwrap_or_default();
        let file_name = request.file_name.clone().unwrap_or_default();

        let label = resolve_label(request.label.as_deref(), &file_name);
        let image_type = resolve_type(request.image_type.as_deref(), &file_name);

        let base64_image_data = if is_link {
            let url = request.link_url.as_deref().unwrap_or_default();
            let agent = resolve_user_agent(user_agent, &self.config.default_user_agent);
            tracing::debug!(%url, "fetching linked image");
            let bytes = self.fetcher.fetch(url, agent).await?;
            format!("data:{};base64,{}", image_type, BASE64.encode(&bytes))
        } else {
            request.base64_image_data.clone().unwrap_or_default()
        };

        let record = ImageRecord {
            id: Uuid::now_v7(),
            label,
            file_name,
            image_type,
            image_url: request.link_url.clone(),
            base64_image_data,
            // flipped to true if/when object detection succeeds
            objects_detected: false,
            created_at: Utc::now(),
        };

        let saved = self.images.insert(record).await?;
        tracing::info!(image_id = %saved.id, detect_objects, "image persisted");
        let mut view = ImageView::from(&saved);

        if detect_objects {
            view.objects = self.detect_and_tag(&saved).await?;
            view.objects_detected = true;
        }
        Ok(view)
    }

    /// Decodes the stored payload into a transient temp file, runs the
    /// detector against it, and caches one tag per distinct name. The temp
    /// file is removed on every exit path via the `NamedTempFile` guard.
    async fn detect_and_tag(&self, record: &ImageRecord) -> Result<Vec<String>> {
        let payload = strip_data_uri(&record.base64_image_data)?;
        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| AppError::DataFormat(e.to_string()))?;

        let temp = tempfile::Builder::new()
            .prefix("pictag_")
            .suffix(&format!(".{}", file_extension(&record.file_name)))
            .tempfile()
            .map_err(|e| AppError::Internal(format!("temp file: {e}")))?;
        temp.as_file()
            .write_all(&bytes)
            .map_err(|e| AppError::Internal(format!("temp file: {e}")))?;

        let names = self.detector.detect_objects(temp.path(), record.id).await?;

        // The schema never stores duplicate names for one image, so we
        // deduplicate here. Exact string equality only: "Dog" and "dog"
        // are distinct rows even though lookups match case-insensitively.
        let mut seen = HashSet::new();
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            if seen.insert(name.clone()) {
                unique.push(name);
            }
        }

        for name in &unique {
            self.tags.insert(ObjectTag::new(record.id, name.clone())).await?;
        }
        self.images.mark_objects_detected(record.id).await?;
        tracing::info!(image_id = %record.id, count = unique.len(), "objects detected and cached");

        // Case-insensitive order; case-variants tie-break on byte order,
        // so uppercase sorts first: ["Cat", "Dog", "dog"].
        unique.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        Ok(unique)
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

fn validate(request: &UploadRequest) -> Result<()> {
    if request.is_link.is_none()
        || request.detect_objects.is_none()
        || !has_text(request.file_name.as_deref())
    {
        tracing::error!(?request, "upload request missing required field");
        return Err(AppError::Validation(
            "upload request is missing a required field".into(),
        ));
    }
    if request.is_link == Some(true) && !has_text(request.link_url.as_deref()) {
        tracing::error!(?request, "linked upload missing URL");
        return Err(AppError::Validation(
            "upload request is missing the link URL".into(),
        ));
    }
    if request.is_link == Some(false) && !has_text(request.base64_image_data.as_deref()) {
        tracing::error!("upload request missing encoded image data");
        return Err(AppError::Validation(
            "upload request is missing image data".into(),
        ));
    }
    Ok(())
}

/// Fallback for when no label is provided: everything before the first dot.
fn resolve_label(label: Option<&str>, file_name: &str) -> String {
    match label {
        Some(l) if !l.trim().is_empty() => l.to_string(),
        _ => file_name.split('.').next().unwrap_or(file_name).to_string(),
    }
}

/// Declared type wins; otherwise `image/` + the extension after the last dot.
fn resolve_type(declared: Option<&str>, file_name: &str) -> String {
    match declared {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => format!("image/{}", file_extension(file_name)),
    }
}

fn file_extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or(file_name)
}

fn resolve_user_agent<'a>(header: Option<&'a str>, default: &'a str) -> &'a str {
    match header {
        Some(h) if !h.trim().is_empty() => h,
        _ => default,
    }
}

/// Returns the base64 payload after the data-URI prefix. The stored data
/// always carries a `data:<type>;base64,` prefix, so a missing comma means
/// the payload is malformed.
fn strip_data_uri(data: &str) -> Result<&str> {
    data.split_once(',')
        .map(|(_, payload)| payload)
        .ok_or_else(|| AppError::DataFormat("missing data-URI delimiter".into()))
}
