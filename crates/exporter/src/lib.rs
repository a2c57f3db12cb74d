//! Metrics aggregator for churn model monitoring
//!
//! Receives metrics records from inference samplers over HTTP and exposes
//! the aggregated state for Prometheus to scrape.

pub mod api;
pub mod config;

pub use api::{create_router, serve, AppState, HttpMetrics};
pub use config::ExporterConfig;
