//! HTTP clients for the prediction endpoint and the metrics aggregator

use super::{async_trait, MetricsSink, PredictionEndpoint};
use crate::error::{EndpointError, SinkError};
use crate::models::{MetricsRecord, PredictionLabel, UpdatePayload};
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Single-row request in the `dataframe_split` layout
#[derive(Debug, Serialize)]
struct InvocationRequest<'a> {
    dataframe_split: DataframeSplit<'a>,
}

#[derive(Debug, Serialize)]
struct DataframeSplit<'a> {
    columns: &'a [String],
    data: [&'a [f64]; 1],
}

#[derive(Debug, Deserialize)]
struct InvocationResponse {
    predictions: Vec<Value>,
}

/// Client for a model-serving `/invocations` endpoint
pub struct HttpPredictionClient {
    client: Client,
    url: Url,
}

impl HttpPredictionClient {
    /// Create a new client; without `timeout` the transport default applies
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;
        let url = Url::parse(url).context("Invalid prediction endpoint URL")?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl PredictionEndpoint for HttpPredictionClient {
    async fn predict(
        &self,
        columns: &[String],
        features: &[f64],
    ) -> Result<PredictionLabel, EndpointError> {
        let request = InvocationRequest {
            dataframe_split: DataframeSplit {
                columns,
                data: [features],
            },
        };

        let response = self
            .client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            // Drain the body so timing covers the full response; a broken
            // body does not change the outcome
            if let Err(e) = response.bytes().await {
                debug!(error = %e, "Failed to read error response body");
            }
            debug!(status = status.as_u16(), "Prediction endpoint returned error status");
            return Err(EndpointError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let parsed: InvocationResponse =
            serde_json::from_slice(&body).map_err(|e| EndpointError::Decode(e.to_string()))?;
        let first = parsed
            .predictions
            .first()
            .ok_or_else(|| EndpointError::Decode("empty predictions array".to_string()))?;

        Ok(PredictionLabel::from_prediction(first))
    }
}

/// Client for the aggregator's `/update` endpoint
pub struct ExporterClient {
    client: Client,
    update_url: Url,
}

impl ExporterClient {
    pub fn new(update_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;
        let update_url = Url::parse(update_url).context("Invalid exporter URL")?;

        Ok(Self { client, update_url })
    }

    pub fn url(&self) -> &Url {
        &self.update_url
    }
}

#[async_trait]
impl MetricsSink for ExporterClient {
    async fn submit(&self, record: &MetricsRecord) -> Result<(), SinkError> {
        let payload = UpdatePayload::from(record);

        let response = self
            .client
            .post(self.update_url.clone())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}
