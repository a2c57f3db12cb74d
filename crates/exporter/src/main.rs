//! Churn Exporter - metrics aggregator for the churn prediction endpoint
//!
//! This binary accepts metrics records from the inference sampler on
//! `POST /update` and serves them to Prometheus on `GET /metrics`.

use anyhow::{Context, Result};
use churn_exporter::{serve, AppState, ExporterConfig};
use monitor_lib::MetricSet;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!(version = EXPORTER_VERSION, "Starting churn-exporter");

    let config = ExporterConfig::load()?;
    info!(addr = %config.bind_address(), "Exporter configured");

    let metrics = MetricSet::new().context("Failed to register metrics")?;
    let state = Arc::new(AppState::new(metrics).context("Failed to register HTTP metrics")?);

    serve(&config.bind_address(), state, shutdown_signal()).await?;
    info!("Shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("SIGINT received");
    }
}
