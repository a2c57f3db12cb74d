//! Error types for each seam of the monitoring pipeline

use thiserror::Error;

/// Errors raised while loading the sample datasets
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("target column '{0}' not found in processed dataset")]
    MissingTargetColumn(String),

    #[error("non-numeric value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
}

/// Errors returned by a prediction endpoint call
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("prediction endpoint unreachable: {0}")]
    Connect(String),

    #[error("prediction request timed out")]
    Timeout,

    #[error("prediction endpoint returned status {0}")]
    Status(u16),

    #[error("could not decode prediction response: {0}")]
    Decode(String),

    #[error("prediction request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for EndpointError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EndpointError::Timeout
        } else if err.is_connect() {
            EndpointError::Connect(err.to_string())
        } else if err.is_decode() {
            EndpointError::Decode(err.to_string())
        } else {
            EndpointError::Other(err.to_string())
        }
    }
}

/// Errors returned when delivering a metrics record to the aggregator
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to reach metrics aggregator: {0}")]
    Transport(String),

    #[error("metrics aggregator rejected record with status {0}")]
    Rejected(u16),
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        SinkError::Transport(err.to_string())
    }
}

/// Reasons an ingest body is refused by the aggregator
#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("request body is empty")]
    Empty,

    #[error("request body is not valid JSON: {0}")]
    Malformed(String),

    #[error("request body is not a JSON object")]
    NotAnObject,

    #[error("request body has no fields")]
    NoFields,

    #[error("invalid field: {0}")]
    InvalidField(String),
}
