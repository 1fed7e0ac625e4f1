//! Utilities for working with Arrow arrays.
//!
//! This module provides utility functions for safely extracting typed
//! columns from record batches with clear error messages.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;

use crate::error::{DashboardError, Result};

/// Get the column index by name from a record batch
///
/// # Errors
/// Returns a `DataAccess` error if the column does not exist
pub fn get_column_index(batch: &RecordBatch, column_name: &str) -> Result<usize> {
    batch.schema().index_of(column_name).map_err(|_| {
        DashboardError::data_access(format!("column '{column_name}' is missing from the table"))
    })
}

/// Get a column from a record batch by name
///
/// # Errors
/// Returns a `DataAccess` error if the column does not exist
pub fn get_column(batch: &RecordBatch, column_name: &str) -> Result<ArrayRef> {
    let idx = get_column_index(batch, column_name)?;
    Ok(batch.column(idx).clone())
}

/// Downcast a column to a specific array type with clear error messages
///
/// # Type Parameters
///
/// * `A` - The target array type to downcast to
///
/// # Arguments
///
/// * `array` - The array reference to downcast
/// * `column_name` - The name of the column (for error messages)
/// * `expected_type_name` - A human-readable name of the expected type (for error messages)
pub fn downcast_array<'a, A: Array + 'static>(
    array: &'a ArrayRef,
    column_name: &str,
    expected_type_name: &str,
) -> Result<&'a A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        DashboardError::data_access(format!(
            "column '{column_name}' is {} but {expected_type_name} was expected",
            array.data_type()
        ))
    })
}

/// Values of a `Float64` column, null entries as `None`
pub fn float_values(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<f64>>> {
    let column = get_column(batch, column_name)?;
    let values = downcast_array::<Float64Array>(&column, column_name, "Float64")?;
    Ok(values.iter().collect())
}

/// Values of a `Utf8` column, null entries as `None`
pub fn string_values(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<String>>> {
    let column = get_column(batch, column_name)?;
    let values = downcast_array::<StringArray>(&column, column_name, "Utf8")?;
    Ok(values.iter().map(|v| v.map(str::to_string)).collect())
}

/// Values of an `Int64` column, null entries as `None`
pub fn int_values(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<i64>>> {
    let column = get_column(batch, column_name)?;
    let values = downcast_array::<Int64Array>(&column, column_name, "Int64")?;
    Ok(values.iter().collect())
}
