//! Core data models for the monitoring pipeline

use crate::error::{EndpointError, IngestError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Raw-table column holding the customer's contract type
pub const CONTRACT_FIELD: &str = "Contract";

/// Raw-table column holding the customer's internet service type
pub const INTERNET_SERVICE_FIELD: &str = "InternetService";

/// Raw-table column holding the customer's monthly charge
pub const MONTHLY_CHARGES_FIELD: &str = "MonthlyCharges";

/// A sampled row: the raw fields alongside the processed feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub index: usize,
    pub raw: BTreeMap<String, String>,
    pub processed: Vec<f64>,
}

impl FeatureRecord {
    /// Look up a raw field by column name
    pub fn raw_field(&self, name: &str) -> Option<&str> {
        self.raw.get(name).map(String::as_str)
    }
}

/// Class label returned by the churn model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionLabel {
    #[serde(rename = "Churn")]
    Churn,
    #[serde(rename = "No Churn")]
    NoChurn,
}

impl PredictionLabel {
    /// Map a raw model output onto a label.
    ///
    /// Only a value equal to `1` (integer, float or boolean `true`) is a
    /// churn prediction; everything else is treated as no churn.
    pub fn from_prediction(value: &Value) -> Self {
        let positive = match value {
            Value::Bool(flag) => *flag,
            Value::Number(n) => n.as_f64() == Some(1.0),
            _ => false,
        };

        if positive {
            PredictionLabel::Churn
        } else {
            PredictionLabel::NoChurn
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionLabel::Churn => "Churn",
            PredictionLabel::NoChurn => "No Churn",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a sampling cycle did not produce a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    ConnectionError,
    BadStatus,
    Timeout,
    Other,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::ConnectionError => "connection_error",
            FailureReason::BadStatus => "bad_status",
            FailureReason::Timeout => "timeout",
            FailureReason::Other => "other",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&EndpointError> for FailureReason {
    fn from(err: &EndpointError) -> Self {
        match err {
            EndpointError::Connect(_) => FailureReason::ConnectionError,
            EndpointError::Status(_) => FailureReason::BadStatus,
            EndpointError::Timeout => FailureReason::Timeout,
            EndpointError::Decode(_) | EndpointError::Other(_) => FailureReason::Other,
        }
    }
}

/// Result of one prediction call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionOutcome {
    Success { label: PredictionLabel },
    Failure { reason: FailureReason },
}

/// Signals derived from a successful prediction
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessMetrics {
    pub latency_seconds: f64,
    pub label: PredictionLabel,
    pub contract_type: String,
    pub internet_service_type: String,
    pub avg_monthly_charges: f64,
}

/// Unit of transport from the sampler to the aggregator
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsRecord {
    Success(SuccessMetrics),
    Failure {
        reason: FailureReason,
        /// Only present when the endpoint answered with an error status
        latency_seconds: Option<f64>,
    },
}

impl MetricsRecord {
    pub fn failure(reason: FailureReason) -> Self {
        MetricsRecord::Failure {
            reason,
            latency_seconds: None,
        }
    }

    pub fn outcome(&self) -> PredictionOutcome {
        match self {
            MetricsRecord::Success(metrics) => PredictionOutcome::Success {
                label: metrics.label,
            },
            MetricsRecord::Failure { reason, .. } => PredictionOutcome::Failure { reason: *reason },
        }
    }

    pub fn latency_seconds(&self) -> Option<f64> {
        match self {
            MetricsRecord::Success(metrics) => Some(metrics.latency_seconds),
            MetricsRecord::Failure {
                latency_seconds, ..
            } => *latency_seconds,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MetricsRecord::Success(_))
    }
}

/// JSON body accepted by the aggregator's `/update` endpoint
///
/// Every field is optional on the wire. The sampler always sends either the
/// full success field set or the failure flag; the aggregator accepts any
/// non-empty object and updates whatever metrics the present fields allow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_monthly_charges: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl UpdatePayload {
    /// Decode and validate a raw request body
    pub fn parse(body: &[u8]) -> Result<Self, IngestError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(IngestError::Empty);
        }

        let value: Value =
            serde_json::from_slice(body).map_err(|e| IngestError::Malformed(e.to_string()))?;

        match &value {
            Value::Object(fields) if fields.is_empty() => return Err(IngestError::NoFields),
            Value::Object(_) => {}
            _ => return Err(IngestError::NotAnObject),
        }

        let payload: UpdatePayload =
            serde_json::from_value(value).map_err(|e| IngestError::InvalidField(e.to_string()))?;
        payload.validate()?;

        Ok(payload)
    }

    fn validate(&self) -> Result<(), IngestError> {
        if let Some(latency) = self.latency {
            if !latency.is_finite() || latency < 0.0 {
                return Err(IngestError::InvalidField(format!(
                    "latency must be a non-negative number, got {}",
                    latency
                )));
            }
        }
        Ok(())
    }

    /// Whether the body reports a failed prediction
    pub fn is_failure(&self) -> bool {
        self.prediction_error == Some(true)
    }
}

impl From<&MetricsRecord> for UpdatePayload {
    fn from(record: &MetricsRecord) -> Self {
        match record {
            MetricsRecord::Success(metrics) => UpdatePayload {
                latency: Some(metrics.latency_seconds),
                prediction: Some(metrics.label.as_str().to_string()),
                contract: Some(metrics.contract_type.clone()),
                internet_service: Some(metrics.internet_service_type.clone()),
                avg_monthly_charges: Some(metrics.avg_monthly_charges),
                ..Default::default()
            },
            MetricsRecord::Failure {
                reason,
                latency_seconds,
            } => UpdatePayload {
                latency: *latency_seconds,
                prediction_error: Some(true),
                error_reason: Some(reason.as_str().to_string()),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_from_prediction() {
        assert_eq!(PredictionLabel::from_prediction(&json!(1)), PredictionLabel::Churn);
        assert_eq!(PredictionLabel::from_prediction(&json!(1.0)), PredictionLabel::Churn);
        assert_eq!(PredictionLabel::from_prediction(&json!(true)), PredictionLabel::Churn);
        assert_eq!(PredictionLabel::from_prediction(&json!(0)), PredictionLabel::NoChurn);
        assert_eq!(PredictionLabel::from_prediction(&json!(2)), PredictionLabel::NoChurn);
        assert_eq!(PredictionLabel::from_prediction(&json!("1")), PredictionLabel::NoChurn);
        assert_eq!(PredictionLabel::from_prediction(&Value::Null), PredictionLabel::NoChurn);
    }

    #[test]
    fn test_failure_reason_from_endpoint_error() {
        assert_eq!(
            FailureReason::from(&EndpointError::Connect("refused".into())),
            FailureReason::ConnectionError
        );
        assert_eq!(FailureReason::from(&EndpointError::Status(503)), FailureReason::BadStatus);
        assert_eq!(FailureReason::from(&EndpointError::Timeout), FailureReason::Timeout);
        assert_eq!(
            FailureReason::from(&EndpointError::Decode("eof".into())),
            FailureReason::Other
        );
    }

    #[test]
    fn test_success_record_wire_shape() {
        let record = MetricsRecord::Success(SuccessMetrics {
            latency_seconds: 0.5,
            label: PredictionLabel::NoChurn,
            contract_type: "Two year".to_string(),
            internet_service_type: "DSL".to_string(),
            avg_monthly_charges: 42.5,
        });

        let body = serde_json::to_value(UpdatePayload::from(&record)).unwrap();
        assert_eq!(
            body,
            json!({
                "latency": 0.5,
                "prediction": "No Churn",
                "contract": "Two year",
                "internet_service": "DSL",
                "avg_monthly_charges": 42.5
            })
        );
    }

    #[test]
    fn test_failure_record_wire_shape() {
        let record = MetricsRecord::failure(FailureReason::ConnectionError);
        let body = serde_json::to_value(UpdatePayload::from(&record)).unwrap();
        assert_eq!(
            body,
            json!({"prediction_error": true, "error_reason": "connection_error"})
        );

        let record = MetricsRecord::Failure {
            reason: FailureReason::BadStatus,
            latency_seconds: Some(0.25),
        };
        let body = serde_json::to_value(UpdatePayload::from(&record)).unwrap();
        assert_eq!(body["latency"], json!(0.25));
        assert_eq!(body["error_reason"], json!("bad_status"));
    }

    #[test]
    fn test_parse_rejects_empty_and_malformed_bodies() {
        assert_eq!(UpdatePayload::parse(b""), Err(IngestError::Empty));
        assert_eq!(UpdatePayload::parse(b"  \n"), Err(IngestError::Empty));
        assert_eq!(UpdatePayload::parse(b"{}"), Err(IngestError::NoFields));
        assert_eq!(UpdatePayload::parse(b"[1, 2]"), Err(IngestError::NotAnObject));
        assert_eq!(UpdatePayload::parse(b"null"), Err(IngestError::NotAnObject));
        assert!(matches!(
            UpdatePayload::parse(b"{\"latency\":"),
            Err(IngestError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_field_types() {
        assert!(matches!(
            UpdatePayload::parse(br#"{"latency": "fast"}"#),
            Err(IngestError::InvalidField(_))
        ));
        assert!(matches!(
            UpdatePayload::parse(br#"{"latency": -0.1, "prediction": "Churn"}"#),
            Err(IngestError::InvalidField(_))
        ));
    }

    #[test]
    fn test_parse_accepts_failure_flag_only() {
        let payload = UpdatePayload::parse(br#"{"prediction_error": true}"#).unwrap();
        assert!(payload.is_failure());
        assert!(payload.error_reason.is_none());
        assert!(payload.prediction.is_none());
    }

    #[test]
    fn test_record_outcome_and_latency() {
        let failure = MetricsRecord::failure(FailureReason::Timeout);
        assert_eq!(
            failure.outcome(),
            PredictionOutcome::Failure {
                reason: FailureReason::Timeout
            }
        );
        assert_eq!(failure.latency_seconds(), None);
        assert!(!failure.is_success());
    }
}
