//! # Pictag Binary
//!
//! The entry point that assembles the application based on compile-time
//! features: the SQLite store and the Vision detector client are wired into
//! the pipeline behind the pt-core ports.

use std::sync::Arc;
use std::time::Duration;

use pt_api::{router, AppState};
use pt_configs::Settings;
use pt_service::{HttpLinkFetcher, ImageIngestService, ImageQueryService, IngestConfig};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-sqlite")]
use pt_db_sqlite::SqliteStore;

#[cfg(feature = "detect-vision")]
use pt_detect_vision::{VisionConfig, VisionObjectDetector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load()?;

    // 1. Persistence: one SQLite store backs both ports
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(SqliteStore::connect(&settings.database.url).await?);

    // 2. Object detection client
    #[cfg(feature = "detect-vision")]
    let detector = Arc::new(VisionObjectDetector::new(VisionConfig {
        endpoint: settings.detector.endpoint,
        api_key: settings.detector.api_key,
        timeout: Duration::from_secs(settings.detector.timeout_secs),
    })?);

    // 3. Outbound fetch for remote-link uploads
    let fetcher = Arc::new(HttpLinkFetcher::new(Duration::from_secs(
        settings.fetch.timeout_secs,
    ))?);

    let mut ingest_config = IngestConfig::default();
    if let Some(agent) = settings.fetch.user_agent.clone() {
        ingest_config.default_user_agent = agent;
    }

    let state = AppState {
        ingest: Arc::new(ImageIngestService::new(
            store.clone(),
            store.clone(),
            detector,
            fetcher,
            ingest_config,
        )),
        query: Arc::new(ImageQueryService::new(store.clone(), store)),
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!(%addr, "pictag starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
