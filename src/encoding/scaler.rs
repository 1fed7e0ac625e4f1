//! Scale-only standardization of the encoded matrix.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Deviations at or below this are treated as zero
const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

/// Divides every column by its population standard deviation
///
/// There is no centering: a value of zero stays zero, so the one-hot block
/// keeps its sparsity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    scales: Vec<f64>,
}

impl Scaler {
    /// Fit one scale per column
    ///
    /// Columns are processed in parallel; the scales come back in column
    /// order.
    #[must_use]
    pub fn fit(columns: &[Vec<Option<f64>>]) -> Self {
        let scales = columns.par_iter().map(|c| column_scale(c)).collect();
        Self { scales }
    }

    /// Fitted scale of each column
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Divide each column by its scale, keeping nulls
    ///
    /// # Errors
    /// Returns a `SchemaFit` error if the column count differs from the fit.
    pub fn transform(&self, columns: Vec<Vec<Option<f64>>>) -> Result<Vec<Vec<Option<f64>>>> {
        if columns.len() != self.scales.len() {
            return Err(DashboardError::schema_fit(format!(
                "scaler was fitted on {} columns but received {}",
                self.scales.len(),
                columns.len()
            )));
        }

        Ok(columns
            .into_iter()
            .zip(&self.scales)
            .map(|(column, scale)| {
                column
                    .into_iter()
                    .map(|value| value.map(|v| v / scale))
                    .collect()
            })
            .collect())
    }
}

/// Population standard deviation over the finite values, or 1 when it is
/// zero or undefined
fn column_scale(values: &[Option<f64>]) -> f64 {
    let finite: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return 1.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let count = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / count;
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let std = variance.sqrt();

    if std.is_finite() && std > MIN_SCALE {
        std
    } else {
        1.0
    }
}
