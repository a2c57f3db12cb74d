//! Observability infrastructure for the monitoring pipeline
//!
//! Provides:
//! - Prometheus metrics aggregated from sampler reports (request counts,
//!   prediction results, latency, drift signals)
//! - Structured logging of sampler events with tracing

use crate::models::{FailureReason, PredictionLabel, UpdatePayload};
use prometheus::core::Collector;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Label value used when a failure record carries no reason
pub const UNSPECIFIED_REASON: &str = "unspecified";

/// Process-wide metric state of the aggregator.
///
/// Each instance owns its own registry, so independent sets can coexist in
/// one process. Every metric synchronizes on its own, which keeps updates to
/// unrelated labels from contending. Clones share the same underlying metrics.
#[derive(Clone)]
pub struct MetricSet {
    registry: Registry,
    requests_total: IntCounter,
    invalid_requests_total: IntCounter,
    results_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    latency_seconds: Histogram,
    avg_monthly_charges: Gauge,
    contract_type_total: IntCounterVec,
    internet_service_total: IntCounterVec,
}

impl MetricSet {
    /// Create a metric set registered on a fresh registry
    pub fn new() -> prometheus::Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Create a metric set registered on `registry`
    pub fn with_registry(registry: Registry) -> prometheus::Result<Self> {
        let requests_total = IntCounter::new(
            "prediction_requests_total",
            "Total number of prediction requests.",
        )?;
        let invalid_requests_total =
            IntCounter::new("invalid_requests_total", "Total invalid requests.")?;
        let results_total = IntCounterVec::new(
            Opts::new("prediction_results_total", "Total predictions by result."),
            &["result"],
        )?;
        let prediction_errors_total = IntCounterVec::new(
            Opts::new(
                "prediction_errors_total",
                "Total failed predictions by reason.",
            ),
            &["reason"],
        )?;
        let latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "prediction_latency_seconds",
                "Model prediction latency in seconds.",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
        )?;
        let avg_monthly_charges = Gauge::new(
            "average_monthly_charges",
            "Average monthly charges of incoming requests.",
        )?;
        let contract_type_total = IntCounterVec::new(
            Opts::new("contract_type_total", "Count of requests by contract type."),
            &["type"],
        )?;
        let internet_service_total = IntCounterVec::new(
            Opts::new(
                "internet_service_total",
                "Count of requests by internet service type.",
            ),
            &["service"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(invalid_requests_total.clone()))?;
        registry.register(Box::new(results_total.clone()))?;
        registry.register(Box::new(prediction_errors_total.clone()))?;
        registry.register(Box::new(latency_seconds.clone()))?;
        registry.register(Box::new(avg_monthly_charges.clone()))?;
        registry.register(Box::new(contract_type_total.clone()))?;
        registry.register(Box::new(internet_service_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            invalid_requests_total,
            results_total,
            prediction_errors_total,
            latency_seconds,
            avg_monthly_charges,
            contract_type_total,
            internet_service_total,
        })
    }

    /// Registry the metrics live in, for registering collectors alongside
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Count a request whose body could not be decoded
    pub fn record_invalid(&self) {
        self.invalid_requests_total.inc();
    }

    /// Apply a decoded update.
    ///
    /// Failure reports only move the request and error counters; success
    /// fields are applied one metric at a time for whichever are present.
    pub fn record_update(&self, update: &UpdatePayload) {
        self.requests_total.inc();

        if update.is_failure() {
            let reason = update.error_reason.as_deref().unwrap_or(UNSPECIFIED_REASON);
            self.prediction_errors_total
                .with_label_values(&[reason])
                .inc();
            return;
        }

        if let Some(result) = &update.prediction {
            self.results_total.with_label_values(&[result.as_str()]).inc();
        }
        if let Some(latency) = update.latency {
            self.latency_seconds.observe(latency);
        }
        if let Some(avg) = update.avg_monthly_charges {
            self.avg_monthly_charges.set(avg);
        }
        if let Some(contract) = &update.contract {
            self.contract_type_total
                .with_label_values(&[contract.as_str()])
                .inc();
        }
        if let Some(service) = &update.internet_service {
            self.internet_service_total
                .with_label_values(&[service.as_str()])
                .inc();
        }
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.get()
    }

    pub fn invalid_requests_total(&self) -> u64 {
        self.invalid_requests_total.get()
    }

    pub fn results_total(&self, result: &str) -> u64 {
        labelled_count(&self.results_total, result)
    }

    pub fn prediction_errors_total(&self, reason: &str) -> u64 {
        labelled_count(&self.prediction_errors_total, reason)
    }

    pub fn contract_type_total(&self, contract: &str) -> u64 {
        labelled_count(&self.contract_type_total, contract)
    }

    pub fn internet_service_total(&self, service: &str) -> u64 {
        labelled_count(&self.internet_service_total, service)
    }

    pub fn avg_monthly_charges(&self) -> f64 {
        self.avg_monthly_charges.get()
    }

    pub fn latency_sample_count(&self) -> u64 {
        self.latency_seconds.get_sample_count()
    }
}

/// Read a single-label counter without creating the series
fn labelled_count(counter: &IntCounterVec, label_value: &str) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .find(|metric| {
            metric
                .get_label()
                .iter()
                .any(|pair| pair.get_value() == label_value)
        })
        .map(|metric| metric.get_counter().get_value() as u64)
        .unwrap_or(0)
}

/// Structured logger for sampler events
///
/// Provides consistent logging for predictions, failures and metric
/// delivery, tagged with the sampler instance name.
#[derive(Clone)]
pub struct SamplerLogger {
    instance: String,
}

impl Default for SamplerLogger {
    fn default() -> Self {
        Self::new("churn-sampler")
    }
}

impl SamplerLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log sampler startup
    pub fn log_startup(&self, version: &str, records: usize, pacing: Duration) {
        info!(
            event = "sampler_started",
            instance = %self.instance,
            sampler_version = %version,
            records = records,
            pacing_secs = pacing.as_secs_f64(),
            "Inference sampler started"
        );
    }

    /// Log a successful prediction
    pub fn log_prediction(
        &self,
        index: usize,
        label: PredictionLabel,
        latency_secs: f64,
        avg_monthly_charges: f64,
    ) {
        info!(
            event = "prediction_succeeded",
            instance = %self.instance,
            index = index,
            result = %label,
            latency_secs = latency_secs,
            avg_monthly_charges = avg_monthly_charges,
            "Prediction: {} (latency {:.4}s)",
            label,
            latency_secs
        );
    }

    /// Log a failed sampling cycle
    pub fn log_failure(
        &self,
        index: Option<usize>,
        reason: FailureReason,
        latency_secs: Option<f64>,
        detail: &str,
    ) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            index = ?index,
            reason = %reason,
            latency_secs = ?latency_secs,
            detail = %detail,
            "Prediction cycle failed"
        );
    }

    /// Log a metrics record the aggregator never received
    pub fn log_delivery_failure(&self, reason: &str) {
        warn!(
            event = "metrics_delivery_failed",
            instance = %self.instance,
            error = %reason,
            "Could not deliver metrics record to aggregator"
        );
    }

    /// Log sampler shutdown
    pub fn log_shutdown(&self, cycles: u64, successes: u64, failures: u64) {
        info!(
            event = "sampler_stopped",
            instance = %self.instance,
            cycles = cycles,
            successes = successes,
            failures = failures,
            "Inference sampler stopped"
        );
    }
}
