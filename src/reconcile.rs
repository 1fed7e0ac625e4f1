//! Schema reconciliation
//!
//! Re-attaches the applicant identifier to the encoded table and appends the
//! encoded columns the model expects but the data did not produce, such as a
//! category no applicant in the file falls into.

use std::sync::Arc;
use std::time::Instant;

use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{DashboardError, Result};
use crate::schema::ID_COLUMN;
use crate::utils::arrow::get_column;
use crate::utils::logging::log_stage_complete;

/// Build the final encoded table: identifier first, then the encoded
/// columns, then every `expected` column the encoding lacks, filled with 0
///
/// The identifier is aligned with the encoded rows by position.
///
/// # Errors
/// Returns a `SchemaFit` error if the two tables differ in row count, or a
/// `DataAccess` error if `derived` has no identifier column.
pub fn reconcile(
    derived: &RecordBatch,
    encoded: &RecordBatch,
    expected: &[String],
) -> Result<RecordBatch> {
    let start = Instant::now();

    if derived.num_rows() != encoded.num_rows() {
        return Err(DashboardError::schema_fit(format!(
            "derived table has {} rows but encoded table has {}",
            derived.num_rows(),
            encoded.num_rows()
        )));
    }

    let ids = get_column(derived, ID_COLUMN)?;
    let encoded_schema = encoded.schema();

    let mut fields = Vec::with_capacity(encoded.num_columns() + 1 + expected.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());
    fields.push(Arc::new(Field::new(ID_COLUMN, ids.data_type().clone(), true)));
    columns.push(ids);
    fields.extend(encoded_schema.fields().iter().cloned());
    columns.extend(encoded.columns().iter().cloned());

    for name in expected {
        if encoded_schema.index_of(name).is_ok() {
            continue;
        }
        log::info!("Adding expected column '{name}' absent from the data, filled with 0");
        fields.push(Arc::new(Field::new(name, DataType::Float64, true)));
        columns.push(Arc::new(Float64Array::from(vec![0.0; encoded.num_rows()])));
    }

    let reconciled = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .map_err(|e| DashboardError::schema_fit(format!("failed to reconcile schema: {e}")))?;

    log_stage_complete(
        "Reconciled schema",
        reconciled.num_rows(),
        reconciled.num_columns(),
        start.elapsed(),
    );
    Ok(reconciled)
}
