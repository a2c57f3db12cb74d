//! Sample sources yielding paired raw/processed feature records
//!
//! The raw table supplies the human-readable fields used for drift metrics;
//! the processed table supplies the feature vector sent to the model. Rows
//! are aligned by position.

use crate::error::SourceError;
use crate::models::FeatureRecord;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Index-addressable source of feature records
pub trait SampleSource: Send + Sync {
    /// Number of addressable records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the processed feature columns, in vector order
    fn feature_columns(&self) -> &[String];

    /// Fetch the record at `index`, `None` when out of range
    fn record(&self, index: usize) -> Option<FeatureRecord>;
}

/// Sample source backed by two CSV files loaded into memory
#[derive(Debug, Clone)]
pub struct CsvSampleSource {
    columns: Vec<String>,
    raw: Vec<BTreeMap<String, String>>,
    processed: Vec<Vec<f64>>,
}

impl CsvSampleSource {
    /// Load the raw and processed tables, dropping `target_column` from the
    /// processed one
    pub fn load(
        raw_path: impl AsRef<Path>,
        processed_path: impl AsRef<Path>,
        target_column: &str,
    ) -> Result<Self, SourceError> {
        let raw = read_raw_table(raw_path.as_ref())?;
        let (columns, processed) = read_processed_table(processed_path.as_ref(), target_column)?;

        if raw.len() != processed.len() {
            warn!(
                raw_rows = raw.len(),
                processed_rows = processed.len(),
                "Raw and processed datasets differ in length, using aligned prefix"
            );
        }

        let source = Self {
            columns,
            raw,
            processed,
        };
        info!(
            records = source.len(),
            features = source.columns.len(),
            "Loaded sample datasets"
        );

        Ok(source)
    }
}

impl SampleSource for CsvSampleSource {
    fn len(&self) -> usize {
        self.raw.len().min(self.processed.len())
    }

    fn feature_columns(&self) -> &[String] {
        &self.columns
    }

    fn record(&self, index: usize) -> Option<FeatureRecord> {
        if index >= self.len() {
            return None;
        }
        Some(FeatureRecord {
            index,
            raw: self.raw[index].clone(),
            processed: self.processed[index].clone(),
        })
    }
}

fn read_error(path: &Path, source: csv::Error) -> SourceError {
    SourceError::Read {
        path: path.display().to_string(),
        source,
    }
}

fn read_raw_table(path: &Path) -> Result<Vec<BTreeMap<String, String>>, SourceError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| read_error(path, e))?;
    let headers = reader.headers().map_err(|e| read_error(path, e))?.clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| read_error(path, e))?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.to_string(), value.trim().to_string()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn read_processed_table(
    path: &Path,
    target_column: &str,
) -> Result<(Vec<String>, Vec<Vec<f64>>), SourceError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| read_error(path, e))?;
    let headers = reader.headers().map_err(|e| read_error(path, e))?.clone();

    let target_idx = headers
        .iter()
        .position(|h| h == target_column)
        .ok_or_else(|| SourceError::MissingTargetColumn(target_column.to_string()))?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target_idx)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| read_error(path, e))?;
        let mut features = Vec::with_capacity(columns.len());

        for (i, value) in record.iter().enumerate() {
            if i == target_idx {
                continue;
            }
            let parsed = parse_feature(value).ok_or_else(|| SourceError::InvalidValue {
                row,
                column: headers.get(i).unwrap_or_default().to_string(),
                value: value.to_string(),
            })?;
            features.push(parsed);
        }
        rows.push(features);
    }

    Ok((columns, rows))
}

/// Parse a processed cell; one-hot columns may be written as booleans
fn parse_feature(value: &str) -> Option<f64> {
    let value = value.trim();
    match value {
        "True" | "true" | "TRUE" => Some(1.0),
        "False" | "false" | "FALSE" => Some(0.0),
        _ => value.parse::<f64>().ok(),
    }
}

/// Sample source over records already in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySampleSource {
    columns: Vec<String>,
    records: Vec<FeatureRecord>,
}

impl InMemorySampleSource {
    pub fn new(columns: Vec<String>, records: Vec<FeatureRecord>) -> Self {
        Self { columns, records }
    }
}

impl SampleSource for InMemorySampleSource {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn feature_columns(&self) -> &[String] {
        &self.columns
    }

    fn record(&self, index: usize) -> Option<FeatureRecord> {
        self.records.get(index).cloned()
    }
}
