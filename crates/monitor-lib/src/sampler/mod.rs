//! Inference sampling against a prediction endpoint
//!
//! This module drives traffic at a model-serving endpoint with records
//! drawn from a [`SampleSource`](crate::source::SampleSource), times each
//! call, derives performance and drift signals and forwards them to the
//! metrics aggregator.

mod client;
mod r#loop;


pub use client::{ExporterClient, HttpPredictionClient};
pub use r#loop::{
    CycleReport, InferenceSampler, SamplerBuilder, SamplerConfig, SamplerStats,
    DEFAULT_PACING,
};

use crate::error::{EndpointError, SinkError};
use crate::models::{MetricsRecord, PredictionLabel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use async_trait::async_trait;

/// Trait for prediction endpoint implementations
#[async_trait]
pub trait PredictionEndpoint: Send + Sync {
    /// Submit one feature row and return the predicted label
    async fn predict(
        &self,
        columns: &[String],
        features: &[f64],
    ) -> Result<PredictionLabel, EndpointError>;
}

/// Trait for destinations of metrics records
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Deliver one record
    async fn submit(&self, record: &MetricsRecord) -> Result<(), SinkError>;
}

/// Chooses which record the next cycle samples
pub trait IndexSelector: Send {
    /// Pick an index in `0..len`; `len` is never zero
    fn select(&mut self, len: usize) -> usize;
}

/// Uniform random selection; indices may repeat across cycles
pub struct RandomSelector<R = StdRng> {
    rng: R,
}

impl RandomSelector<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible selection sequence
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng + Send> RandomSelector<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> IndexSelector for RandomSelector<R> {
    fn select(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

#[cfg(test)]
mod selector_tests {
    use super::*;

    #[test]
    fn test_random_selector_stays_in_range() {
        let mut selector = RandomSelector::seeded(7);
        for _ in 0..1000 {
            assert!(selector.select(13) < 13);
        }
        assert_eq!(selector.select(1), 0);
    }

    #[test]
    fn test_seeded_selectors_agree() {
        let mut a = RandomSelector::seeded(42);
        let mut b = RandomSelector::seeded(42);

        let first: Vec<usize> = (0..20).map(|_| a.select(100)).collect();
        let second: Vec<usize> = (0..20).map(|_| b.select(100)).collect();
        assert_eq!(first, second);
    }
}
