//! reqwest-backed implementation of the `LinkFetcher` port.
//!
//! The original service read linked images through an unbounded
//! `URLConnection`; here the client carries a bounded timeout so a stalled
//! remote host fails the request instead of hanging it.

use std::time::Duration;

use async_trait::async_trait;
use pt_core::{AppError, LinkFetcher, Result};
use reqwest::header::USER_AGENT;

pub struct HttpLinkFetcher {
    client: reqwest::Client,
}

impl HttpLinkFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LinkFetcher for HttpLinkFetcher {
    async fn fetch(&self, url: &str, user_agent: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| AppError::Materialization(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Materialization(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Materialization(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
