//! Command-line interface for the sampler

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Churn Sampler
#[derive(Debug, Parser)]
#[command(name = "churn-sampler")]
#[command(
    author,
    version,
    about = "Inference sampler for churn model monitoring",
    long_about = None
)]
pub struct Cli {
    /// Model-serving invocation endpoint
    #[arg(
        long,
        env = "SAMPLER_PREDICTION_URL",
        default_value = "http://127.0.0.1:5001/invocations"
    )]
    pub prediction_url: Url,

    /// Metrics exporter ingestion endpoint
    #[arg(
        long,
        env = "SAMPLER_EXPORTER_URL",
        default_value = "http://127.0.0.1:8001/update"
    )]
    pub exporter_url: Url,

    /// CSV with the raw customer records
    #[arg(
        long,
        env = "SAMPLER_RAW_DATA",
        default_value = "Telco-Customer-Churn_raw.csv"
    )]
    pub raw_data: PathBuf,

    /// CSV with the preprocessed feature rows
    #[arg(
        long,
        env = "SAMPLER_PROCESSED_DATA",
        default_value = "telco_churn_preprocessing.csv"
    )]
    pub processed_data: PathBuf,

    /// Label column to drop from the processed dataset
    #[arg(long, env = "SAMPLER_TARGET_COLUMN", default_value = "Churn_Yes")]
    pub target_column: String,

    /// Number of recent monthly charges in the moving average
    #[arg(long, env = "SAMPLER_WINDOW", default_value_t = 50)]
    pub window: usize,

    /// Seconds to wait between cycles
    #[arg(
        long,
        env = "SAMPLER_INTERVAL_SECS",
        default_value_t = 3.0,
        value_parser = parse_seconds
    )]
    pub interval_secs: f64,

    /// Per-request timeout for prediction calls (none by default)
    #[arg(long, env = "SAMPLER_REQUEST_TIMEOUT_SECS", value_parser = parse_seconds)]
    pub request_timeout_secs: Option<f64>,

    /// Seed for reproducible record selection
    #[arg(long, env = "SAMPLER_SEED")]
    pub seed: Option<u64>,

    /// Stop after this many cycles instead of running until interrupted
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Name reported in structured log events
    #[arg(long, env = "SAMPLER_INSTANCE", default_value = "churn-sampler")]
    pub instance: String,

    /// Emit logs as JSON
    #[arg(long, env = "SAMPLER_JSON_LOGS")]
    pub json_logs: bool,
}

/// Accept a number of seconds that fits in a `Duration`; negatives clamp to zero
fn parse_seconds(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;
    if !secs.is_finite() {
        return Err(format!("`{value}` is not a finite number of seconds"));
    }
    Duration::try_from_secs_f64(secs.max(0.0))
        .map_err(|_| format!("`{value}` is out of range for a duration"))?;
    Ok(secs)
}

impl Cli {
    pub fn pacing(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_secs.max(0.0)).unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "churn-sampler",
            "--prediction-url",
            "http://model:5001/invocations",
            "--interval-secs",
            "0.5",
            "--request-timeout-secs",
            "2",
            "--seed",
            "7",
            "--max-cycles",
            "10",
        ])
        .unwrap();

        assert_eq!(cli.prediction_url.as_str(), "http://model:5001/invocations");
        assert_eq!(cli.pacing(), Duration::from_millis(500));
        assert_eq!(cli.request_timeout(), Some(Duration::from_secs(2)));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.max_cycles, Some(10));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = Cli::try_parse_from(["churn-sampler", "--exporter-url", "not a url"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_infinite_interval_is_rejected() {
        let result = Cli::try_parse_from(["churn-sampler", "--interval-secs", "inf"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["churn-sampler", "--interval-secs", "NaN"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_timeout_is_rejected() {
        let result = Cli::try_parse_from(["churn-sampler", "--request-timeout-secs", "1e30"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_interval_is_clamped() {
        let cli = Cli::try_parse_from(["churn-sampler", "--interval-secs=-1"]).unwrap();
        assert_eq!(cli.pacing(), Duration::ZERO);
    }
}
