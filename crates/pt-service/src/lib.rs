//! # pt-service
//!
//! The ingestion pipeline and query layer for Pictag. Both depend only on
//! the pt-core port traits; concrete stores and detector clients are
//! injected by the binary.

pub mod fetch;
pub mod ingest;
pub mod query;

pub use fetch::HttpLinkFetcher;
pub use ingest::{ImageIngestService, IngestConfig};
pub use query::ImageQueryService;
