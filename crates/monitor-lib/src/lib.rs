//! Monitoring library for a deployed churn prediction endpoint
//!
//! This crate provides the core functionality for:
//! - Sampling feature records and driving inference traffic
//! - Deriving latency and data-drift signals per request
//! - Aggregating those signals into Prometheus metrics
//! - Structured logging of sampler events

pub mod error;
pub mod models;
pub mod observability;
pub mod sampler;
pub mod source;
pub mod window;

pub use error::{EndpointError, IngestError, SinkError, SourceError};
pub use models::*;
pub use observability::{MetricSet, SamplerLogger};
pub use source::{CsvSampleSource, InMemorySampleSource, SampleSource};
pub use window::MovingAverage;
