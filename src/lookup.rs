//! Client lookup
//!
//! Finds an applicant's row by identifier and extracts either its encoded
//! vector, sent to the scoring service, or single derived feature values,
//! shown next to the decision.

use std::fmt;

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::error::{DashboardError, Result};
use crate::schema::ID_COLUMN;
use crate::utils::arrow::{downcast_array, get_column, int_values};

/// Row positions of every identifier in a table
#[derive(Debug, Clone, Default)]
pub struct ClientIndex {
    rows: FxHashMap<i64, Vec<usize>>,
    order: Vec<i64>,
}

impl ClientIndex {
    /// Index the identifier column of `table`
    ///
    /// Rows with a null identifier cannot be looked up and are skipped.
    pub fn build(table: &RecordBatch) -> Result<Self> {
        let ids = int_values(table, ID_COLUMN)?;
        let mut rows: FxHashMap<i64, Vec<usize>> = FxHashMap::default();
        let mut order = Vec::with_capacity(ids.len());

        for (row, id) in ids.into_iter().enumerate() {
            let Some(id) = id else { continue };
            rows.entry(id).or_default().push(row);
            order.push(id);
        }

        let index = Self { rows, order };
        let duplicated = index.duplicates().count();
        if duplicated > 0 {
            log::warn!("{duplicated} applicant identifiers appear on more than one row");
        }
        Ok(index)
    }

    /// Row of the applicant `id`
    ///
    /// # Errors
    /// Returns a `NotFound` error if no row or more than one row has `id`.
    pub fn locate(&self, id: i64) -> Result<usize> {
        match self.rows.get(&id).map(Vec::as_slice) {
            None | Some([]) => Err(DashboardError::client_not_found(id)),
            Some([row]) => Ok(*row),
            Some(rows) => Err(DashboardError::duplicate_client(id, rows.len())),
        }
    }

    /// Every identifier in row order
    #[must_use]
    pub fn ids(&self) -> &[i64] {
        &self.order
    }

    /// Identifiers appearing on more than one row, with their row count
    pub fn duplicates(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.rows
            .iter()
            .filter(|(_, rows)| rows.len() > 1)
            .map(|(id, rows)| (*id, rows.len()))
            .sorted_unstable()
    }
}

/// Row of the applicant `id` in `table`, scanning the identifier column
///
/// # Errors
/// Returns a `NotFound` error unless exactly one row has `id`.
pub fn locate_client(table: &RecordBatch, id: i64) -> Result<usize> {
    let column = get_column(table, ID_COLUMN)?;
    let ids = downcast_array::<Int64Array>(&column, ID_COLUMN, "Int64")?;

    let matches: Vec<usize> = ids
        .iter()
        .positions(|value| value == Some(id))
        .collect();
    match matches.as_slice() {
        [] => Err(DashboardError::client_not_found(id)),
        [row] => Ok(*row),
        rows => Err(DashboardError::duplicate_client(id, rows.len())),
    }
}

/// Values of `row` in every column but the identifier, in schema order
///
/// Null cells come out as `NaN`.
///
/// # Errors
/// Returns a `DataAccess` error if a non-identifier column is not `Float64`.
pub fn row_vector(table: &RecordBatch, row: usize) -> Result<Vec<f64>> {
    let schema = table.schema();
    schema
        .fields()
        .iter()
        .zip(table.columns())
        .filter(|(field, _)| field.name() != ID_COLUMN)
        .map(|(field, column)| {
            let values = downcast_array::<Float64Array>(column, field.name(), "Float64")?;
            Ok(if values.is_null(row) {
                f64::NAN
            } else {
                values.value(row)
            })
        })
        .collect()
}

/// The encoded vector of applicant `id`
///
/// # Errors
/// Returns a `NotFound` error unless exactly one row has `id`.
pub fn client_vector(table: &RecordBatch, id: i64) -> Result<Vec<f64>> {
    let row = locate_client(table, id)?;
    row_vector(table, row)
}

/// A single cell of the derived table
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Missing => f.write_str("n/a"),
        }
    }
}

/// Value of `column` at `row`
///
/// # Errors
/// Returns a `NotFound` error if the column does not exist, or a
/// `DataAccess` error if it has a type other than text or number.
pub fn feature_value(table: &RecordBatch, row: usize, column: &str) -> Result<FeatureValue> {
    let array = table
        .column_by_name(column)
        .ok_or_else(|| DashboardError::column_not_found(column))?;
    if array.is_null(row) {
        return Ok(FeatureValue::Missing);
    }

    let value = match array.data_type() {
        DataType::Utf8 => {
            let values = downcast_array::<StringArray>(array, column, "Utf8")?;
            FeatureValue::Text(values.value(row).to_string())
        }
        DataType::Float64 => {
            let values = downcast_array::<Float64Array>(array, column, "Float64")?;
            number(values.value(row))
        }
        DataType::Int64 => {
            let values = downcast_array::<Int64Array>(array, column, "Int64")?;
            #[allow(clippy::cast_precision_loss)]
            let value = values.value(row) as f64;
            number(value)
        }
        other => {
            return Err(DashboardError::data_access(format!(
                "column '{column}' has unsupported type {other}"
            )));
        }
    };
    Ok(value)
}

fn number(value: f64) -> FeatureValue {
    if value.is_nan() {
        FeatureValue::Missing
    } else {
        FeatureValue::Number(value)
    }
}
