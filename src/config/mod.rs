//! Configuration for loading, the feature pipeline and the scoring client.

use std::time::Duration;

use crate::error::{DashboardError, Result};
use crate::schema::EXPECTED_MISSING_COLUMNS;

/// Default batch size for reading the applicant source
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Default scoring endpoint, a locally served model
pub const DEFAULT_SCORING_URL: &str = "http://127.0.0.1:5000/predictions";

/// Default timeout for one scoring request
pub const DEFAULT_SCORING_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable overriding the loader batch size
pub const ENV_BATCH_SIZE: &str = "PARQUET_BATCH_SIZE";
/// Environment variable overriding the scoring endpoint
pub const ENV_SCORING_URL: &str = "CREDIT_DASH_SCORING_URL";
/// Environment variable overriding the scoring timeout, in seconds
pub const ENV_SCORING_TIMEOUT: &str = "CREDIT_DASH_SCORING_TIMEOUT_SECS";
/// Environment variable enabling strict job-seniority classification
pub const ENV_STRICT_SENIORITY: &str = "CREDIT_DASH_STRICT_SENIORITY";

/// Configuration for the raw loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Number of rows decoded per record batch
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// What to do with rows whose job seniority matches no band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnclassifiedSeniority {
    /// Leave the label null and log how many rows were affected
    #[default]
    Missing,
    /// Fail the pipeline build, naming the first offending applicant
    Reject,
}

/// Configuration for feature derivation and schema reconciliation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineConfig {
    /// Policy for unclassified job seniority
    pub unclassified_seniority: UnclassifiedSeniority,
    /// Encoded columns the scoring model requires even when absent from the sample
    pub expected_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unclassified_seniority: UnclassifiedSeniority::default(),
            expected_columns: EXPECTED_MISSING_COLUMNS
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
        }
    }
}

/// Configuration for the remote scoring service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    /// Prediction endpoint receiving the standardized vector
    pub endpoint: String,
    /// Upper bound on one request, connection included
    pub timeout: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SCORING_URL.to_string(),
            timeout: DEFAULT_SCORING_TIMEOUT,
        }
    }
}

/// Complete dashboard configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardConfig {
    pub loader: LoaderConfig,
    pub pipeline: PipelineConfig,
    pub scoring: ScoringConfig,
}

impl DashboardConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`
    ///
    /// Unset variables keep their default. Set but unparsable values are a
    /// `Config` error rather than being ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_BATCH_SIZE) {
            let batch_size = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    DashboardError::Config(format!(
                        "{ENV_BATCH_SIZE} must be a positive integer, got '{raw}'"
                    ))
                })?;
            config.loader.batch_size = batch_size;
        }

        if let Some(url) = lookup(ENV_SCORING_URL) {
            config.scoring.endpoint = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_SCORING_TIMEOUT) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                DashboardError::Config(format!(
                    "{ENV_SCORING_TIMEOUT} must be a number of seconds, got '{raw}'"
                ))
            })?;
            config.scoring.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(ENV_STRICT_SENIORITY) {
            config.pipeline.unclassified_seniority = if parse_flag(&raw)? {
                UnclassifiedSeniority::Reject
            } else {
                UnclassifiedSeniority::Missing
            };
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(DashboardError::Config(format!(
            "{ENV_STRICT_SENIORITY} must be a boolean, got '{other}'"
        ))),
    }
}
