//! End-to-end handler tests over mocked ports, driven through the router
//! with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use pt_api::{router, AppState};
use pt_core::{
    ImageRecord, MockImageStore, MockLinkFetcher, MockObjectDetector, MockObjectTagStore,
};
use pt_service::{ImageIngestService, ImageQueryService, IngestConfig};
use tower::ServiceExt;
use uuid::Uuid;

fn state(
    images: MockImageStore,
    tags: MockObjectTagStore,
    detector: MockObjectDetector,
    fetcher: MockLinkFetcher,
) -> AppState {
    let images = Arc::new(images);
    let tags = Arc::new(tags);
    AppState {
        ingest: Arc::new(ImageIngestService::new(
            images.clone(),
            tags.clone(),
            Arc::new(detector),
            Arc::new(fetcher),
            IngestConfig::default(),
        )),
        query: Arc::new(ImageQueryService::new(images, tags)),
    }
}

fn default_state() -> AppState {
    state(
        MockImageStore::new(),
        MockObjectTagStore::new(),
        MockObjectDetector::new(),
        MockLinkFetcher::new(),
    )
}

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

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn upload_with_missing_fields_returns_400() {
    let response = router(default_state())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/images")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"label":"no flags here"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "validation");
}

#[tokio::test]
async fn upload_returns_persisted_view() {
    let mut images = MockImageStore::new();
    images.expect_insert().times(1).returning(Ok);

    let response = router(state(
        images,
        MockObjectTagStore::new(),
        MockObjectDetector::new(),
        MockLinkFetcher::new(),
    ))
    .oneshot(
        Request::builder()
            .method("POST")
            .uri("/images")
            .header("content-type", "application/json")
            .header("user-agent", "probe/1.0")
            .body(Body::from(
                r#"{"isLink":false,"detectObjects":false,"fileName":"cat.png","base64ImageData":"data:image/png;base64,QUFBQQ=="}"#,
            ))
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["label"], "cat");
    assert_eq!(body["imageType"], "image/png");
    assert_eq!(body["objectsDetected"], false);
    assert!(body.get("objects").is_none());
}

#[tokio::test]
async fn malformed_image_id_returns_400() {
    let response = router(default_state())
        .oneshot(
            Request::builder()
                .uri("/images/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_identifier");
}

#[tokio::test]
async fn unknown_image_id_returns_404() {
    let mut images = MockImageStore::new();
    images.expect_find_by_id().returning(|_| Ok(None));

    let response = router(state(
        images,
        MockObjectTagStore::new(),
        MockObjectDetector::new(),
        MockLinkFetcher::new(),
    ))
    .oneshot(
        Request::builder()
            .uri(format!("/images/{}", Uuid::now_v7()))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn get_image_enriches_detected_records() {
    let id = Uuid::now_v7();
    let mut images = MockImageStore::new();
    images
        .expect_find_by_id()
        .returning(move |id| Ok(Some(record(id, true))));
    let mut tags = MockObjectTagStore::new();
    tags.expect_find_names_by_image()
        .returning(|_| Ok(vec!["Cat".to_string(), "Dog".to_string()]));

    let response = router(state(
        images,
        tags,
        MockObjectDetector::new(),
        MockLinkFetcher::new(),
    ))
    .oneshot(
        Request::builder()
            .uri(format!("/images/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["imageId"], id.to_string());
    assert_eq!(body["objects"], serde_json::json!(["Cat", "Dog"]));
}

#[tokio::test]
async fn objects_filter_is_repeatable() {
    let tagged = Uuid::now_v7();
    let mut tags = MockObjectTagStore::new();
    tags.expect_find_image_ids_by_name()
        .withf(|name| name == "dog" || name == "cat")
        .returning(move |_| Ok(vec![tagged]));
    tags.expect_find_names_by_image()
        .returning(|_| Ok(vec!["Dog".to_string()]));

    let mut images = MockImageStore::new();
    images
        .expect_find_by_id()
        .returning(move |id| Ok(Some(record(id, true))));

    let response = router(state(
        images,
        tags,
        MockObjectDetector::new(),
        MockLinkFetcher::new(),
    ))
    .oneshot(
        Request::builder()
            .uri("/images?objects=dog&objects=cat")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn list_all_when_no_filter() {
    let mut images = MockImageStore::new();
    images
        .expect_list_all()
        .returning(|| Ok(vec![record(Uuid::now_v7(), false)]));

    let response = router(state(
        images,
        MockObjectTagStore::new(),
        MockObjectDetector::new(),
        MockLinkFetcher::new(),
    ))
    .oneshot(Request::builder().uri("/images").body(Body::empty()).unwrap())
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
