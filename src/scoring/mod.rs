//! Client for the remote scoring model
//!
//! The model is served over HTTP. It receives one client's encoded vector as
//! a single-row matrix and answers with the repayment decision and the
//! model's repayment score.

use std::time::Instant;

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::error::{DashboardError, Result};

/// Request body: the vector as a one-row matrix
#[derive(Debug, Serialize)]
pub struct PredictionRequest<'a> {
    #[serde(rename = "std_donnees_client")]
    pub rows: [&'a [f64]; 1],
}

impl<'a> PredictionRequest<'a> {
    #[must_use]
    pub const fn new(vector: &'a [f64]) -> Self {
        Self { rows: [vector] }
    }
}

/// Scoring response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Whether the model expects repayment problems
    #[serde(rename = "problemes_remboursement")]
    pub repayment_issues: bool,
    /// Model score in [0, 1], higher is safer
    #[serde(rename = "score_remboursement_client")]
    pub repayment_score: f64,
}

impl Prediction {
    fn validate(self) -> Result<Self> {
        if (0.0..=1.0).contains(&self.repayment_score) {
            Ok(self)
        } else {
            Err(DashboardError::scoring(format!(
                "malformed response: score {} is outside [0, 1]",
                self.repayment_score
            )))
        }
    }
}

/// HTTP client bound to one prediction endpoint
#[derive(Debug, Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl ScoringClient {
    /// Create a client for the configured endpoint and timeout
    ///
    /// # Errors
    /// Returns a `Config` error if the endpoint is not an http(s) URL.
    pub fn new(config: &ScoringConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            DashboardError::Config(format!("invalid scoring URL '{}': {e}", config.endpoint))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(DashboardError::Config(format!(
                "scoring URL '{}' must use http or https",
                config.endpoint
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DashboardError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { http, endpoint })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Score one encoded client vector
    ///
    /// # Errors
    /// Returns a `ScoringService` error on transport failure or timeout, on
    /// any status other than 200, and on a body that is not a valid
    /// prediction.
    pub async fn predict(&self, vector: &[f64]) -> Result<Prediction> {
        let start = Instant::now();
        log::debug!(
            "Requesting prediction for a {}-value vector from {}",
            vector.len(),
            self.endpoint
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&PredictionRequest::new(vector))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DashboardError::scoring(format!(
                "service answered {status}: {}",
                body.trim()
            )));
        }

        let body = response.bytes().await?;
        let prediction: Prediction = serde_json::from_slice(&body)
            .map_err(|e| DashboardError::scoring(format!("malformed response: {e}")))?;
        let prediction = prediction.validate()?;

        log::info!(
            "Prediction received in {:?}: score {:.3}, repayment issues {}",
            start.elapsed(),
            prediction.repayment_score,
            prediction.repayment_issues
        );
        Ok(prediction)
    }
}
