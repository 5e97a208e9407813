//! # pt-configs
//!
//! Layered runtime configuration: hard defaults overridden by
//! `PICTAG_`-prefixed environment variables (with `__` as the section
//! separator, e.g. `PICTAG_SERVER__PORT=9000`). A `.env` file is loaded
//! first when present.

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub fetch: FetchSettings,
    pub detector: DetectorSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct FetchSettings {
    /// Overrides the pipeline's built-in desktop-browser User-Agent
    #[serde(default)]
    pub user_agent: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct DetectorSettings {
    pub endpoint: String,
    pub api_key: SecretString,
    pub timeout_secs: u64,
}

fn default_builder(
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("database.url", "sqlite:pictag.db")?
        // The original service left outbound calls unbounded; 30s is
        // the documented default here.
        .set_default("fetch.timeout_secs", 30)?
        .set_default(
            "detector.endpoint",
            "https://vision.googleapis.com/v1/images:annotate",
        )?
        .set_default("detector.api_key", "")?
        .set_default("detector.timeout_secs", 30)
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        if dotenvy::dotenv().is_ok() {
            tracing::debug!("loaded environment from .env");
        }

        let settings = default_builder()?
            .add_source(
                config::Environment::with_prefix("PICTAG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
