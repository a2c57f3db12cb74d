//! Exporter configuration

use anyhow::{Context, Result};
use serde::Deserialize;

/// Exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// Interface to listen on
    #[serde(default = "default_host")]
    pub host: String,

    /// Port serving both ingestion and scraping
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from `EXPORTER_*` environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(config::Environment::with_prefix("EXPORTER"))
    }

    fn load_from(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(env)
            .build()
            .context("Failed to read exporter configuration")?;

        config
            .try_deserialize()
            .context("Invalid exporter configuration")
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
