//! Presentation data for the decision view
//!
//! Builds what the dashboard shows next to a prediction: the decision text,
//! the band of the score gauge, and the distribution of a feature across all
//! applicants with the selected client's position in it.

use std::fmt;
use std::fmt::Write as _;

use arrow::array::{Array, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::error::{DashboardError, Result};
use crate::lookup::FeatureValue;
use crate::schema::compatibility::is_numeric;
use crate::scoring::Prediction;

/// Upper bound of the risky band of the score gauge
pub const RISKY_MAX_SCORE: f64 = 0.35;
/// Lower bound of the safe band of the score gauge
pub const SAFE_MIN_SCORE: f64 = 0.65;
/// Default number of histogram bins
pub const DEFAULT_BINS: usize = 20;

/// Coloured step of the score gauge a score falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Risky,
    Uncertain,
    Safe,
}

impl ScoreBand {
    /// `Risky` below 0.35, `Safe` above 0.65, `Uncertain` in between
    /// (both bounds included)
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < RISKY_MAX_SCORE {
            Self::Risky
        } else if score > SAFE_MIN_SCORE {
            Self::Safe
        } else {
            Self::Uncertain
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Risky => "risky",
            Self::Uncertain => "uncertain",
            Self::Safe => "safe",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a credit application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Refused,
    Accepted,
}

impl Decision {
    /// Refused when the model expects repayment problems
    #[must_use]
    pub const fn from_prediction(prediction: &Prediction) -> Self {
        if prediction.repayment_issues {
            Self::Refused
        } else {
            Self::Accepted
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Refused => "Credit application refused",
            Self::Accepted => "Credit application accepted",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Distribution of one feature across all applicants
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    /// Equal-width bins over the finite values of a numeric column
    Histogram {
        column: String,
        min: f64,
        max: f64,
        width: f64,
        counts: Vec<usize>,
    },
    /// Category counts in first-seen order, nulls excluded
    Categories {
        column: String,
        counts: Vec<(String, usize)>,
    },
}

impl Distribution {
    /// Distribution of `column` in `batch`, histogrammed into `bins` bins
    /// when numeric
    ///
    /// # Errors
    /// Returns a `NotFound` error for an unknown column and a `DataAccess`
    /// error for a column that is neither text nor numeric.
    pub fn from_column(batch: &RecordBatch, column: &str, bins: usize) -> Result<Self> {
        let array = batch
            .column_by_name(column)
            .ok_or_else(|| DashboardError::column_not_found(column))?;

        match array.data_type() {
            DataType::Utf8 => {
                let values = array
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| DashboardError::data_access(format!("column '{column}' is not Utf8")))?;
                Ok(Self::categories(column, values.iter().flatten()))
            }
            data_type if is_numeric(data_type) => {
                let array = cast(array, &DataType::Float64)?;
                let values = array
                    .as_any()
                    .downcast_ref::<Float64Array>()
                    .ok_or_else(|| DashboardError::data_access(format!("column '{column}' is not numeric")))?;
                let finite: Vec<f64> = values.iter().flatten().filter(|v| v.is_finite()).collect();
                Ok(Self::histogram(column, &finite, bins))
            }
            other => Err(DashboardError::data_access(format!(
                "column '{column}' has type {other} and cannot be charted"
            ))),
        }
    }

    fn categories<'a>(column: &str, values: impl Iterator<Item = &'a str>) -> Self {
        let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
        let mut counts: Vec<(String, usize)> = Vec::new();
        for value in values {
            let idx = *positions.entry(value).or_insert_with(|| {
                counts.push((value.to_string(), 0));
                counts.len() - 1
            });
            counts[idx].1 += 1;
        }
        Self::Categories {
            column: column.to_string(),
            counts,
        }
    }

    fn histogram(column: &str, values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

        if values.is_empty() {
            return Self::Histogram {
                column: column.to_string(),
                min: 0.0,
                max: 0.0,
                width: 1.0,
                counts: Vec::new(),
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let width = if max > min { (max - min) / bins as f64 } else { 1.0 };
        let mut histogram = Self::Histogram {
            column: column.to_string(),
            min,
            max,
            width,
            counts: vec![0; bins],
        };
        for value in values {
            if let Some(bin) = histogram.bin_of(*value) {
                if let Self::Histogram { counts, .. } = &mut histogram {
                    counts[bin] += 1;
                }
            }
        }
        histogram
    }

    /// Bin holding a numeric value, the maximum falling in the last bin
    fn bin_of(&self, value: f64) -> Option<usize> {
        let Self::Histogram {
            min,
            max,
            width,
            counts,
            ..
        } = self
        else {
            return None;
        };
        if counts.is_empty() || !value.is_finite() || value < *min || value > *max {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bin = ((value - min) / width).floor() as usize;
        Some(bin.min(counts.len() - 1))
    }

    /// Column the distribution was built from
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Histogram { column, .. } | Self::Categories { column, .. } => column,
        }
    }

    /// Number of values counted
    #[must_use]
    pub fn total(&self) -> usize {
        match self {
            Self::Histogram { counts, .. } => counts.iter().sum(),
            Self::Categories { counts, .. } => counts.iter().map(|(_, n)| n).sum(),
        }
    }

    /// Label and count of every bin or category
    #[must_use]
    pub fn entries(&self) -> Vec<(String, usize)> {
        match self {
            Self::Histogram { min, width, counts, .. } => counts
                .iter()
                .enumerate()
                .map(|(i, count)| {
                    #[allow(clippy::cast_precision_loss)]
                    let lower = min + width * i as f64;
                    (format!("[{:.2}, {:.2})", lower, lower + width), *count)
                })
                .collect(),
            Self::Categories { counts, .. } => counts.clone(),
        }
    }

    /// Text chart, one bar per entry scaled to `bar_width`, marking `client`
    #[must_use]
    pub fn render(&self, bar_width: usize, client: Option<usize>) -> String {
        let entries = self.entries();
        let peak = entries.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);
        let label_width = entries.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

        let mut out = format!("{}\n", self.column());
        for (i, (label, count)) in entries.iter().enumerate() {
            let bar = "#".repeat(count * bar_width / peak);
            let marker = if client == Some(i) { "  <- client" } else { "" };
            let _ = writeln!(out, "  {label:<label_width$} | {bar} {count}{marker}");
        }
        out
    }
}

/// Index of the bin or category holding the client's value
///
/// `None` when the value is missing or does not match the distribution's
/// kind.
#[must_use]
pub fn client_position(distribution: &Distribution, value: &FeatureValue) -> Option<usize> {
    match (distribution, value) {
        (Distribution::Histogram { .. }, FeatureValue::Number(v)) => distribution.bin_of(*v),
        (Distribution::Categories { counts, .. }, FeatureValue::Text(v)) => {
            counts.iter().position(|(category, _)| category == v)
        }
        _ => None,
    }
}
