//! # Core Traits (Ports)
//!
//! The ingestion pipeline and query layer depend only on these contracts;
//! plugin crates supply the concrete store, detector, and fetcher clients.

use std::path::Path;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ImageRecord, ObjectTag};

/// Persistence contract for image records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert(&self, record: ImageRecord) -> Result<ImageRecord>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ImageRecord>>;
    // naively not paging this query
    async fn list_all(&self) -> Result<Vec<ImageRecord>>;
    /// Monotonic false -> true transition of the detection-completed flag.
    async fn mark_objects_detected(&self, id: Uuid) -> Result<()>;
}

/// Persistence contract for (image, object-name) associations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectTagStore: Send + Sync {
    async fn insert(&self, tag: ObjectTag) -> Result<()>;
    async fn find_names_by_image(&self, image_id: Uuid) -> Result<Vec<String>>;
    /// Case-insensitive match on the object name.
    async fn find_image_ids_by_name(&self, object_name: &str) -> Result<Vec<Uuid>>;
}

/// Remote annotation service contract. Takes a file-backed byte source and
/// the owning image id; returns detected object names, possibly with
/// duplicates across detection entries.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect_objects(&self, image_file: &Path, image_id: Uuid) -> Result<Vec<String>>;
}

/// Outbound fetch contract for remote-link uploads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LinkFetcher: Send + Sync {
    /// Reads the full response body of an HTTP GET against `url`,
    /// sending `user_agent` as the User-Agent header.
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Vec<u8>>;
}
