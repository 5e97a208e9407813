//! # pt-detect-vision
//!
//! `ObjectDetector` implementation backed by a Google Cloud Vision–style
//! `images:annotate` endpoint. The image bytes are read from the temp file
//! handed over by the pipeline, base64-encoded into an OBJECT_LOCALIZATION
//! request, and the localized annotation names are returned as-is —
//! duplicates included; deduplication is the pipeline's concern.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pt_core::{AppError, ObjectDetector, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub struct VisionConfig {
    /// Annotation endpoint, e.g. "https://vision.googleapis.com/v1/images:annotate"
    pub endpoint: String,
    pub api_key: SecretString,
    pub timeout: Duration,
}

pub struct VisionObjectDetector {
    client: reqwest::Client,
    config: VisionConfig,
}

impl VisionObjectDetector {
    pub fn new(config: VisionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateBatchRequest {
    requests: Vec<AnnotateRequest>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    r#type: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateBatchResponse {
    #[serde(default)]
    responses: Vec<AnnotateResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResponse {
    #[serde(default)]
    localized_object_annotations: Vec<LocalizedObjectAnnotation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalizedObjectAnnotation {
    name: String,
}

fn build_request(image_bytes: &[u8]) -> AnnotateBatchRequest {
    AnnotateBatchRequest {
        requests: vec![AnnotateRequest {
            image: ImageContent {
                content: BASE64.encode(image_bytes),
            },
            features: vec![Feature {
                r#type: "OBJECT_LOCALIZATION",
            }],
        }],
    }
}

#[async_trait]
impl ObjectDetector for VisionObjectDetector {
    async fn detect_objects(&self, image_file: &Path, image_id: Uuid) -> Result<Vec<String>> {
        let bytes = tokio::fs::read(image_file)
            .await
            .map_err(|e| AppError::Detection(format!("reading image file: {e}")))?;

        tracing::debug!(%image_id, bytes = bytes.len(), "annotating image");
        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", self.config.api_key.expose_secret())])
            .json(&build_request(&bytes))
            .send()
            .await
            .map_err(|e| AppError::Detection(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Detection(e.to_string()))?;

        let parsed: AnnotateBatchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Detection(e.to_string()))?;

        let names: Vec<String> = parsed
            .responses
            .into_iter()
            .flat_map(|r| r.localized_object_annotations)
            .map(|a| a.name)
            .collect();
        tracing::info!(%image_id, count = names.len(), "annotation complete");
        Ok(names)
    }
}
