//! # Query Layer
//!
//! Read-side operations over the two stores, enriching each record with
//! its cached object names once detection has completed.

use std::collections::HashSet;
use std::sync::Arc;

use pt_core::{AppError, ImageRecord, ImageStore, ImageView, ObjectTagStore, Result};
use uuid::Uuid;

pub struct ImageQueryService {
    images: Arc<dyn ImageStore>,
    tags: Arc<dyn ObjectTagStore>,
}

impl ImageQueryService {
    pub fn new(images: Arc<dyn ImageStore>, tags: Arc<dyn ObjectTagStore>) -> Self {
        Self { images, tags }
    }

    // naively not paging this request
    pub async fn list_all(&self) -> Result<Vec<ImageView>> {
        let records = self.images.list_all().await?;
        let mut views = Vec::with_capacity(records.len());
        for record in &records {
            views.push(self.enrich(record).await?);
        }
        Ok(views)
    }

    pub async fn get_by_id(&self, image_id: &str) -> Result<ImageView> {
        let id = Uuid::parse_str(image_id)
            .map_err(|_| AppError::InvalidIdentifier(image_id.to_string()))?;
        match self.images.find_by_id(id).await? {
            Some(record) => self.enrich(&record).await,
            None => {
                tracing::error!(%image_id, "image not found");
                Err(AppError::NotFound(image_id.to_string()))
            }
        }
    }

    /// Union of images tagged with any of the listed names. Name matching
    /// is case-insensitive, unlike the case-sensitive dedup applied when
    /// tags are persisted.
    pub async fn list_by_object_names(&self, object_names: &[String]) -> Result<Vec<ImageView>> {
        let mut image_ids: HashSet<Uuid> = HashSet::new();
        for name in object_names {
            image_ids.extend(self.tags.find_image_ids_by_name(name).await?);
        }

        let mut views = Vec::with_capacity(image_ids.len());
        for id in image_ids {
            if let Some(record) = self.images.find_by_id(id).await? {
                views.push(self.enrich(&record).await?);
            }
        }
        Ok(views)
    }

    /// Attaches cached object names; records without a completed detection
    /// pass through untouched.
    async fn enrich(&self, record: &ImageRecord) -> Result<ImageView> {
        let mut view = ImageView::from(record);
        if record.objects_detected {
            view.objects = self.tags.find_names_by_image(record.id).await?;
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pt_core::{MockImageStore, MockObjectTagStore};

    fn record(id: Uuid, detected: bool) -> ImageRecord {
        ImageRecord {
            id,
            label: "photo".to_string(),
            file_name: "photo.jpg".to_string(),
            image_type: "image/jpeg".to_string(),
            image_url: None,
            base64_image_data: "data:image/jpeg;base64,AAAA".to_string(),
            objects_detected: detected,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn get_by_id_rejects_malformed_identifiers() {
        let svc = ImageQueryService::new(
            Arc::new(MockImageStore::new()),
            Arc::new(MockObjectTagStore::new()),
        );
        let err = svc.get_by_id("not-a-uuid").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn get_by_id_distinguishes_not_found() {
        let mut images = MockImageStore::new();
        images.expect_find_by_id().returning(|_| Ok(None));
        let svc = ImageQueryService::new(Arc::new(images), Arc::new(MockObjectTagStore::new()));

        let id = Uuid::now_v7().to_string();
        let err = svc.get_by_id(&id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn enrichment_only_runs_for_detected_records() {
        let detected_id = Uuid::now_v7();
        let plain_id = Uuid::now_v7();

        let mut images = MockImageStore::new();
        images.expect_list_all().returning(move || {
            Ok(vec![record(detected_id, true), record(plain_id, false)])
        });

        let mut tags = MockObjectTagStore::new();
        tags.expect_find_names_by_image()
            .times(1)
            .withf(move |id| *id == detected_id)
            .returning(|_| Ok(vec!["Cat".to_string()]));

        let svc = ImageQueryService::new(Arc::new(images), Arc::new(tags));
        let views = svc.list_all().await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].objects, vec!["Cat"]);
        assert!(views[1].objects.is_empty());
    }

    #[tokio::test]
    async fn object_name_filter_unions_and_dedups_image_ids() {
        let shared = Uuid::now_v7();

        let mut tags = MockObjectTagStore::new();
        tags.expect_find_image_ids_by_name()
            .withf(|name| name == "dog")
            .returning(move |_| Ok(vec![shared]));
        tags.expect_find_image_ids_by_name()
            .withf(|name| name == "cat")
            .returning(move |_| Ok(vec![shared]));
        tags.expect_find_names_by_image()
            .returning(|_| Ok(vec!["Dog".to_string(), "cat".to_string()]));

        let mut images = MockImageStore::new();
        images
            .expect_find_by_id()
            .times(1)
            .returning(move |id| Ok(Some(record(id, true))));

        let svc = ImageQueryService::new(Arc::new(images), Arc::new(tags));
        let views = svc
            .list_by_object_names(&["dog".to_string(), "cat".to_string()])
            .await
            .unwrap();
        assert_eq!(views.len(), 1, "shared image id should appear once");
    }
}
