//! # Domain Models
//!
//! These structs represent the core entities of Pictag.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted upload: the image payload plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: Uuid,
    /// Human-readable label; defaults to the filename stem when absent
    pub label: String,
    pub file_name: String,
    /// Declared or derived MIME type (e.g., "image/png")
    pub image_type: String,
    /// Source URL, set only for remote-link uploads
    pub image_url: Option<String>,
    /// Data-URI or bare base64 payload as received/materialized
    pub base64_image_data: String,
    /// Flips false -> true once a detection attempt resolves; never back
    pub objects_detected: bool,
    pub created_at: DateTime<Utc>,
}

/// One (image, detected-object-name) association.
/// Unique per pair; created or deleted, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTag {
    pub image_id: Uuid,
    pub object_name: String,
    pub created_at: DateTime<Utc>,
}

impl ObjectTag {
    pub fn new(image_id: Uuid, object_name: impl Into<String>) -> Self {
        Self {
            image_id,
            object_name: object_name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Transient upload input as posted by clients. All fields are optional at
/// the wire level; the ingestion pipeline rejects incomplete combinations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadRequest {
    pub is_link: Option<bool>,
    pub detect_objects: Option<bool>,
    pub file_name: Option<String>,
    pub label: Option<String>,
    pub image_type: Option<String>,
    pub base64_image_data: Option<String>,
    pub link_url: Option<String>,
}

/// API representation of an image, optionally enriched with detected
/// object names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageView {
    pub image_id: String,
    pub label: String,
    pub file_name: String,
    pub image_type: String,
    pub image_url: Option<String>,
    pub objects_detected: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<String>,
}

impl From<&ImageRecord> for ImageView {
    // detected object names are attached outside of this conversion
    fn from(record: &ImageRecord) -> Self {
        Self {
            image_id: record.id.to_string(),
            label: record.label.clone(),
            file_name: record.file_name.clone(),
            image_type: record.image_type.clone(),
            image_url: record.image_url.clone(),
            objects_detected: record.objects_detected,
            objects: Vec::new(),
        }
    }
}
