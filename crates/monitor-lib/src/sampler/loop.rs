//! Inference sampling loop
//!
//! Repeats one cycle until shut down: pick a record, call the prediction
//! endpoint, time the call, derive a metrics record, forward it to the
//! aggregator and pause for a fixed interval.

use super::{IndexSelector, MetricsSink, PredictionEndpoint, RandomSelector};
use crate::models::{
    FailureReason, FeatureRecord, MetricsRecord, PredictionLabel, SuccessMetrics, CONTRACT_FIELD,
    INTERNET_SERVICE_FIELD, MONTHLY_CHARGES_FIELD,
};
use crate::observability::SamplerLogger;
use crate::source::SampleSource;
use crate::window::{MovingAverage, DEFAULT_WINDOW_CAPACITY};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Pause between the end of one cycle and the start of the next
pub const DEFAULT_PACING: Duration = Duration::from_secs(3);

/// Configuration for the sampling loop
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Fixed delay after every cycle (default: 3 seconds)
    pub pacing: Duration,
    /// Number of monthly charges kept for the moving average (default: 50)
    pub window_capacity: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
        }
    }
}

/// What one cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Sampled index, `None` if no record could be drawn
    pub index: Option<usize>,
    pub record: MetricsRecord,
    /// Whether the aggregator accepted the record
    pub delivered: bool,
}

/// Counters accumulated over the life of the loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerStats {
    pub cycles: u64,
    pub successes: u64,
    pub failures: u64,
    pub undelivered: u64,
}

impl SamplerStats {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if report.record.is_success() {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        if !report.delivered {
            self.undelivered += 1;
        }
    }
}

/// Raw fields a successful cycle reports alongside the prediction
struct DriftFields {
    contract_type: String,
    internet_service_type: String,
    monthly_charges: f64,
}

impl DriftFields {
    fn from_record(record: &FeatureRecord) -> Result<Self, String> {
        let field = |name: &str| {
            record
                .raw_field(name)
                .map(str::to_string)
                .ok_or_else(|| format!("raw record {} has no '{}' field", record.index, name))
        };

        let contract_type = field(CONTRACT_FIELD)?;
        let internet_service_type = field(INTERNET_SERVICE_FIELD)?;
        let charges = field(MONTHLY_CHARGES_FIELD)?;
        let monthly_charges = charges
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid {} value '{}'", MONTHLY_CHARGES_FIELD, charges))?;

        Ok(Self {
            contract_type,
            internet_service_type,
            monthly_charges,
        })
    }
}

/// Sequential sampling loop; owns its moving-average window exclusively
pub struct InferenceSampler {
    source: Arc<dyn SampleSource>,
    endpoint: Arc<dyn PredictionEndpoint>,
    sink: Arc<dyn MetricsSink>,
    selector: Box<dyn IndexSelector>,
    window: MovingAverage,
    config: SamplerConfig,
    logger: SamplerLogger,
    stats: SamplerStats,
}

impl InferenceSampler {
    /// Create a new sampler
    pub fn new(
        source: Arc<dyn SampleSource>,
        endpoint: Arc<dyn PredictionEndpoint>,
        sink: Arc<dyn MetricsSink>,
        selector: Box<dyn IndexSelector>,
        config: SamplerConfig,
        logger: SamplerLogger,
    ) -> Self {
        Self {
            source,
            endpoint,
            sink,
            selector,
            window: MovingAverage::new(config.window_capacity),
            config,
            logger,
            stats: SamplerStats::default(),
        }
    }

    /// Run until a shutdown signal arrives, then return the accumulated stats
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> SamplerStats {
        info!(
            pacing_secs = self.config.pacing.as_secs_f64(),
            records = self.source.len(),
            "Starting inference sampling loop"
        );

        loop {
            let report = tokio::select! {
                report = self.run_cycle() => report,
                _ = shutdown.recv() => break,
            };
            self.stats.record(&report);

            tokio::select! {
                _ = sleep(self.config.pacing) => {}
                _ = shutdown.recv() => break,
            }
        }

        info!("Shutting down inference sampling loop");
        self.logger.log_shutdown(
            self.stats.cycles,
            self.stats.successes,
            self.stats.failures,
        );
        self.stats
    }

    /// Run exactly `cycles` cycles, pacing between them, and return the
    /// accumulated stats
    pub async fn run_cycles(&mut self, cycles: u64) -> SamplerStats {
        for n in 0..cycles {
            if n > 0 {
                sleep(self.config.pacing).await;
            }
            let report = self.run_cycle().await;
            self.stats.record(&report);
        }
        self.stats.clone()
    }

    /// Execute a single sample/predict/report cycle.
    ///
    /// Never fails: every problem becomes a failure record that is still
    /// forwarded to the aggregator.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let (index, record) = self.sample_and_predict().await;

        let delivered = match self.sink.submit(&record).await {
            Ok(()) => true,
            Err(e) => {
                self.logger.log_delivery_failure(&e.to_string());
                false
            }
        };

        CycleReport {
            index,
            record,
            delivered,
        }
    }

    async fn sample_and_predict(&mut self) -> (Option<usize>, MetricsRecord) {
        let len = self.source.len();
        if len == 0 {
            return (None, self.fail(None, FailureReason::Other, None, "sample source is empty"));
        }

        let index = self.selector.select(len);
        let Some(sample) = self.source.record(index) else {
            let detail = format!("index {} out of range for {} records", index, len);
            return (None, self.fail(None, FailureReason::Other, None, &detail));
        };

        let start = Instant::now();
        let result = self
            .endpoint
            .predict(self.source.feature_columns(), &sample.processed)
            .await;
        let latency = start.elapsed().as_secs_f64();

        let label = match result {
            Ok(label) => label,
            Err(e) => {
                let reason = FailureReason::from(&e);
                // Latency is only meaningful when the endpoint actually answered
                let latency = (reason == FailureReason::BadStatus).then_some(latency);
                return (Some(index), self.fail(Some(index), reason, latency, &e.to_string()));
            }
        };

        let record = match DriftFields::from_record(&sample) {
            Ok(drift) => self.succeed(index, label, latency, drift),
            Err(detail) => self.fail(Some(index), FailureReason::Other, None, &detail),
        };
        (Some(index), record)
    }

    fn succeed(
        &mut self,
        index: usize,
        label: PredictionLabel,
        latency: f64,
        drift: DriftFields,
    ) -> MetricsRecord {
        let avg_monthly_charges = self.window.push(drift.monthly_charges);
        self.logger
            .log_prediction(index, label, latency, avg_monthly_charges);

        MetricsRecord::Success(SuccessMetrics {
            latency_seconds: latency,
            label,
            contract_type: drift.contract_type,
            internet_service_type: drift.internet_service_type,
            avg_monthly_charges,
        })
    }

    fn fail(
        &self,
        index: Option<usize>,
        reason: FailureReason,
        latency: Option<f64>,
        detail: &str,
    ) -> MetricsRecord {
        self.logger.log_failure(index, reason, latency, detail);
        MetricsRecord::Failure {
            reason,
            latency_seconds: latency,
        }
    }

    /// Statistics so far
    pub fn stats(&self) -> &SamplerStats {
        &self.stats
    }

    /// Current moving average of monthly charges
    pub fn average_monthly_charges(&self) -> Option<f64> {
        self.window.mean()
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }
}

/// Builder for creating the sampling loop
pub struct SamplerBuilder {
    source: Option<Arc<dyn SampleSource>>,
    endpoint: Option<Arc<dyn PredictionEndpoint>>,
    sink: Option<Arc<dyn MetricsSink>>,
    selector: Option<Box<dyn IndexSelector>>,
    logger: SamplerLogger,
    config: SamplerConfig,
}

impl SamplerBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            source: None,
            endpoint: None,
            sink: None,
            selector: None,
            logger: SamplerLogger::default(),
            config: SamplerConfig::default(),
        }
    }

    /// Set the sample source
    pub fn source(mut self, source: Arc<dyn SampleSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the prediction endpoint
    pub fn endpoint(mut self, endpoint: Arc<dyn PredictionEndpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the metrics sink
    pub fn sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the index selector (default: uniform random from entropy)
    pub fn selector(mut self, selector: Box<dyn IndexSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Set the pause between cycles
    pub fn pacing(mut self, pacing: Duration) -> Self {
        self.config.pacing = pacing;
        self
    }

    /// Set the moving average window capacity
    pub fn window_capacity(mut self, capacity: usize) -> Self {
        self.config.window_capacity = capacity;
        self
    }

    /// Set the structured logger
    pub fn logger(mut self, logger: SamplerLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Build the sampler
    pub fn build(self) -> Result<InferenceSampler> {
        let source = self
            .source
            .ok_or_else(|| anyhow::anyhow!("Sample source is required"))?;
        let endpoint = self
            .endpoint
            .ok_or_else(|| anyhow::anyhow!("Prediction endpoint is required"))?;
        let sink = self
            .sink
            .ok_or_else(|| anyhow::anyhow!("Metrics sink is required"))?;
        let selector = self
            .selector
            .unwrap_or_else(|| Box::new(RandomSelector::from_entropy()));

        debug!(
            pacing_ms = self.config.pacing.as_millis() as u64,
            window_capacity = self.config.window_capacity,
            "Building inference sampler"
        );

        Ok(InferenceSampler::new(
            source,
            endpoint,
            sink,
            selector,
            self.config,
            self.logger,
        ))
    }
}

impl Default for SamplerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
