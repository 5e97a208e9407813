//! # pt-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `pt-core` domain models. One `SqliteStore` backs both the
//! `ImageStore` and `ObjectTagStore` ports.

use std::str::FromStr;

use async_trait::async_trait;
use pt_core::{AppError, ImageRecord, ImageStore, ObjectTag, ObjectTagStore, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const CREATE_IMAGES: &str = "
CREATE TABLE IF NOT EXISTS images (
    id                BLOB PRIMARY KEY,
    label             TEXT NOT NULL,
    file_name         TEXT NOT NULL,
    image_type        TEXT NOT NULL,
    image_url         TEXT,
    base64_image_data TEXT NOT NULL,
    objects_detected  BOOLEAN NOT NULL DEFAULT FALSE,
    created_at        TEXT NOT NULL
)";

// Composite primary key: the schema never stores duplicate object names
// for one image.
const CREATE_IMAGE_OBJECTS: &str = "
CREATE TABLE IF NOT EXISTS image_objects (
    image_id    BLOB NOT NULL REFERENCES images(id),
    object_name TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (image_id, object_name)
)";

pub struct SqliteStore {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> ImageRecord {
    ImageRecord {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        label: row.get("label"),
        file_name: row.get("file_name"),
        image_type: row.get("image_type"),
        image_url: row.get("image_url"),
        base64_image_data: row.get("base64_image_data"),
        objects_detected: row.get("objects_detected"),
        created_at: row.get("created_at"),
    }
}

impl SqliteStore {
    /// Opens (or creates) the database at `url` and ensures the schema
    /// exists. In-memory databases are pinned to a single connection so
    /// every handle sees the same data.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Internal(format!("sqlite url: {e}")))?
            .create_if_missing(true);
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Internal(format!("sqlite connect: {e}")))?;

        for statement in [CREATE_IMAGES, CREATE_IMAGE_OBJECTS] {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| AppError::Internal(format!("sqlite schema: {e}")))?;
        }
        tracing::debug!(%url, "sqlite store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ImageStore for SqliteStore {
    async fn insert(&self, record: ImageRecord) -> Result<ImageRecord> {
        sqlx::query(
            "INSERT INTO images (id, label, file_name, image_type, image_url, base64_image_data, objects_detected, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(record.id))
        .bind(&record.label)
        .bind(&record.file_name)
        .bind(&record.image_type)
        .bind(&record.image_url)
        .bind(&record.base64_image_data)
        .bind(record.objects_detected)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(e.to_string()))?;
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        let row = sqlx::query("SELECT * FROM images WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(row.as_ref().map(row_to_record))
    }

    async fn list_all(&self) -> Result<Vec<ImageRecord>> {
        let rows = sqlx::query("SELECT * FROM images ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn mark_objects_detected(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE images SET objects_detected = TRUE WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectTagStore for SqliteStore {
    /// Idempotent on the (image, name) pair: re-detecting an image never
    /// produces duplicate rows.
    async fn insert(&self, tag: ObjectTag) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO image_objects (image_id, object_name, created_at) VALUES (?, ?, ?)",
        )
        .bind(uuid_to_blob(tag.image_id))
        .bind(&tag.object_name)
        .bind(tag.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Persistence(e.to_string()))?;
        Ok(())
    }

    async fn find_names_by_image(&self, image_id: Uuid) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT object_name FROM image_objects WHERE image_id = ? ORDER BY object_name ASC",
        )
        .bind(uuid_to_blob(image_id))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(rows.iter().map(|row| row.get("object_name")).collect())
    }

    async fn find_image_ids_by_name(&self, object_name: &str) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT image_id FROM image_objects WHERE LOWER(object_name) = LOWER(?)",
        )
        .bind(object_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(rows
            .iter()
            .map(|row| blob_to_uuid(row.get::<Vec<u8>, _>("image_id").as_slice()))
            .collect())
    }
}
