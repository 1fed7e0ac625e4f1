//! Record batch transformations used by the pipeline stages.
//!
//! Every function returns a new batch; inputs are never modified.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{DashboardError, Result};
use crate::utils::arrow::array_utils::get_column_index;

/// Replace the `consumed` columns by a derived column appended at the end
///
/// # Errors
/// Fails if a consumed column is missing, if `name` already exists after the
/// consumed columns are dropped, or if the array length does not match.
pub fn replace_with_derived(
    batch: &RecordBatch,
    consumed: &[&str],
    name: &str,
    array: ArrayRef,
) -> Result<RecordBatch> {
    for column in consumed {
        get_column_index(batch, column)?;
    }

    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns() + 1);
    let mut columns = Vec::with_capacity(batch.num_columns() + 1);
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        if consumed.contains(&field.name().as_str()) {
            continue;
        }
        if field.name() == name {
            return Err(DashboardError::data_access(format!(
                "derived column '{name}' is already present"
            )));
        }
        fields.push(field.clone());
        columns.push(column.clone());
    }

    fields.push(Arc::new(Field::new(name, array.data_type().clone(), true)));
    columns.push(array);

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(|e| {
        DashboardError::data_access_with_source(format!("failed to derive column '{name}'"), e)
    })
}

/// A batch without the named columns
pub fn drop_columns(batch: &RecordBatch, names: &[&str]) -> Result<RecordBatch> {
    for column in names {
        get_column_index(batch, column)?;
    }

    let keep: Vec<usize> = batch
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !names.contains(&f.name().as_str()))
        .map(|(idx, _)| idx)
        .collect();

    batch
        .project(&keep)
        .map_err(|e| DashboardError::data_access_with_source("failed to drop columns", e))
}

/// Column names of a batch, in order
#[must_use]
pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}
