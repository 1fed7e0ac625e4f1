//! One-hot encoding of a single categorical column.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::schema::encoded_column_name;

/// The fitted categories of one categorical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    /// Source field name
    pub field: String,
    /// Observed categories, sorted, without duplicates
    pub categories: Vec<String>,
}

impl CategoricalColumn {
    /// Fit on the observed values of `field`
    ///
    /// Nulls are not a category. Sorting makes the category order, and so
    /// the encoded column order, independent of row order.
    #[must_use]
    pub fn fit(field: &str, values: &[Option<String>]) -> Self {
        let categories = values
            .iter()
            .flatten()
            .unique()
            .sorted()
            .cloned()
            .collect();
        Self {
            field: field.to_string(),
            categories,
        }
    }

    /// Position of `category` among the fitted categories
    #[must_use]
    pub fn index_of(&self, category: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(category))
            .ok()
    }

    /// Names of the indicator columns, one per category
    pub fn column_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories
            .iter()
            .map(|c| encoded_column_name(&self.field, c))
    }

    /// Indicator columns for `values`, one per category
    ///
    /// A null or unseen value yields a row of zeros.
    #[must_use]
    pub fn encode(&self, values: &[Option<String>]) -> Vec<Vec<Option<f64>>> {
        let mut indicators = vec![vec![Some(0.0); values.len()]; self.categories.len()];
        for (row, value) in values.iter().enumerate() {
            if let Some(idx) = value.as_deref().and_then(|v| self.index_of(v)) {
                indicators[idx][row] = Some(1.0);
            }
        }
        indicators
    }

    /// Category of each row given its indicator columns
    ///
    /// A row whose indicators are all zero decodes to `None`. Returns `Err`
    /// with the row index if a row has more than one indicator set.
    pub fn decode(&self, indicators: &[Vec<Option<f64>>]) -> Result<Vec<Option<String>>, usize> {
        let rows = indicators.first().map_or(0, Vec::len);
        (0..rows)
            .map(|row| {
                let mut hot = indicators
                    .iter()
                    .positions(|column| column.get(row).copied().flatten().is_some_and(|v| v != 0.0));
                match (hot.next(), hot.next()) {
                    (None, _) => Ok(None),
                    (Some(idx), None) => Ok(self.categories.get(idx).cloned()),
                    (Some(_), Some(_)) => Err(row),
                }
            })
            .collect()
    }
}
