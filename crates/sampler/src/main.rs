//! Churn Sampler - drives inference traffic at a churn prediction endpoint
//!
//! Samples customer records, calls the model-serving endpoint, and reports
//! latency, prediction results and drift signals to the metrics exporter.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use monitor_lib::sampler::{ExporterClient, HttpPredictionClient, RandomSelector, SamplerBuilder};
use monitor_lib::{CsvSampleSource, SampleSource, SamplerLogger};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SAMPLER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let source = CsvSampleSource::load(&cli.raw_data, &cli.processed_data, &cli.target_column)
        .context("Failed to load sample datasets")?;
    let records = source.len();

    let endpoint = HttpPredictionClient::new(cli.prediction_url.as_str(), cli.request_timeout())?;
    let sink = ExporterClient::new(cli.exporter_url.as_str())?;
    info!(
        prediction_url = %endpoint.url(),
        exporter_url = %sink.url(),
        "Sampler configured"
    );

    let selector = match cli.seed {
        Some(seed) => RandomSelector::seeded(seed),
        None => RandomSelector::from_entropy(),
    };

    let logger = SamplerLogger::new(cli.instance.clone());
    logger.log_startup(SAMPLER_VERSION, records, cli.pacing());

    let mut sampler = SamplerBuilder::new()
        .source(Arc::new(source))
        .endpoint(Arc::new(endpoint))
        .sink(Arc::new(sink))
        .selector(Box::new(selector))
        .pacing(cli.pacing())
        .window_capacity(cli.window)
        .logger(logger.clone())
        .build()?;

    if let Some(cycles) = cli.max_cycles {
        let stats = sampler.run_cycles(cycles).await;
        logger.log_shutdown(stats.cycles, stats.successes, stats.failures);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(sampler.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("SIGINT received");
    let _ = shutdown_tx.send(());

    let stats = handle.await.context("Sampler task failed")?;
    info!(
        cycles = stats.cycles,
        undelivered = stats.undelivered,
        "Sampler finished"
    );

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
