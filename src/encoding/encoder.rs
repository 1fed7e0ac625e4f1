//! The fitted categorical/numeric encoder.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::encoding::one_hot::CategoricalColumn;
use crate::encoding::scaler::Scaler;
use crate::error::{DashboardError, Result};
use crate::schema::compatibility::is_numeric;
use crate::schema::scaled_column_name;

/// Encoder state fitted on one dataset
///
/// Holds the categories of every categorical field, the numeric fields, and
/// the scale of every output column. Output columns are the one-hot block
/// followed by the numeric block, each in input column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedEncoder {
    categorical: Vec<CategoricalColumn>,
    numeric: Vec<String>,
    columns: Vec<String>,
    scaler: Scaler,
}

impl FittedEncoder {
    /// Fit on a feature table without the identifier column
    ///
    /// `Utf8` columns are categorical, numeric columns are scaled, and any
    /// other type is rejected.
    ///
    /// # Errors
    /// Returns a `SchemaFit` error if the table is empty, holds no
    /// categorical or no numeric column, or has a column of another type.
    pub fn fit(features: &RecordBatch) -> Result<Self> {
        if features.num_rows() == 0 {
            return Err(DashboardError::schema_fit(
                "cannot fit the encoder on an empty table",
            ));
        }

        let mut categorical = Vec::new();
        let mut numeric = Vec::new();
        for (field, column) in features.schema().fields().iter().zip(features.columns()) {
            match field.data_type() {
                DataType::Utf8 => {
                    categorical.push(CategoricalColumn::fit(field.name(), &text_values(column, field.name())?));
                }
                data_type if is_numeric(data_type) => numeric.push(field.name().clone()),
                other => {
                    return Err(DashboardError::schema_fit(format!(
                        "column '{}' has type {other}, which is neither categorical nor numeric",
                        field.name()
                    )));
                }
            }
        }

        if categorical.is_empty() {
            return Err(DashboardError::schema_fit("no categorical columns to encode"));
        }
        if numeric.is_empty() {
            return Err(DashboardError::schema_fit("no numeric columns to encode"));
        }

        let columns = categorical
            .iter()
            .flat_map(CategoricalColumn::column_names)
            .chain(numeric.iter().map(|f| scaled_column_name(f)))
            .collect();

        let mut encoder = Self {
            categorical,
            numeric,
            columns,
            scaler: Scaler::fit(&[]),
        };
        encoder.scaler = Scaler::fit(&encoder.unscaled(features)?);

        log::debug!(
            "Fitted encoder: {} categorical fields, {} numeric fields, {} output columns",
            encoder.categorical.len(),
            encoder.numeric.len(),
            encoder.columns.len()
        );
        Ok(encoder)
    }

    /// Encode and scale a feature table
    ///
    /// Columns the encoder was not fitted on are ignored.
    ///
    /// # Errors
    /// Returns a `SchemaFit` error if a fitted column is missing or has the
    /// wrong type.
    pub fn transform(&self, features: &RecordBatch) -> Result<RecordBatch> {
        let scaled = self.scaler.transform(self.unscaled(features)?)?;

        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|name| Field::new(name, DataType::Float64, true))
            .collect();
        let arrays: Vec<ArrayRef> = scaled
            .into_iter()
            .map(|values| Arc::new(Float64Array::from(values)) as ArrayRef)
            .collect();

        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .map_err(|e| DashboardError::schema_fit(format!("failed to assemble encoded table: {e}")))
    }

    /// Output column names, in order
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Names of the categorical fields, in input order
    pub fn categorical_fields(&self) -> impl Iterator<Item = &str> {
        self.categorical.iter().map(|c| c.field.as_str())
    }

    /// Names of the numeric fields, in input order
    #[must_use]
    pub fn numeric_fields(&self) -> &[String] {
        &self.numeric
    }

    /// Fitted categories of a categorical field
    #[must_use]
    pub fn categories(&self, field: &str) -> Option<&[String]> {
        self.categorical_column(field).map(|c| c.categories.as_slice())
    }

    /// Fitted scale of every output column, in output order
    #[must_use]
    pub fn scales(&self) -> &[f64] {
        self.scaler.scales()
    }

    /// Recover the category of each row of `encoded` for `field`
    ///
    /// Rows whose indicators are all zero decode to `None`.
    ///
    /// # Errors
    /// Returns a `SchemaFit` error if `field` is not a fitted categorical
    /// field, if an indicator column is missing, or if a row has more than
    /// one indicator set.
    pub fn decode_one_hot(&self, encoded: &RecordBatch, field: &str) -> Result<Vec<Option<String>>> {
        let column = self.categorical_column(field).ok_or_else(|| {
            DashboardError::schema_fit(format!("'{field}' is not a fitted categorical field"))
        })?;

        let indicators = column
            .column_names()
            .map(|name| {
                let array = encoded_column(encoded, &name)?;
                let values = array.as_any().downcast_ref::<Float64Array>().ok_or_else(|| {
                    DashboardError::schema_fit(format!("indicator column '{name}' is not Float64"))
                })?;
                Ok(values.iter().collect())
            })
            .collect::<Result<Vec<Vec<Option<f64>>>>>()?;

        column.decode(&indicators).map_err(|row| {
            DashboardError::schema_fit(format!(
                "row {row} has more than one '{field}' indicator set"
            ))
        })
    }

    /// The fitted state as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DashboardError::schema_fit(format!("failed to serialize encoder: {e}")))
    }

    fn categorical_column(&self, field: &str) -> Option<&CategoricalColumn> {
        self.categorical.iter().find(|c| c.field == field)
    }

    /// One-hot indicators followed by raw numeric values, one vector per
    /// output column
    fn unscaled(&self, features: &RecordBatch) -> Result<Vec<Vec<Option<f64>>>> {
        let mut matrix = Vec::with_capacity(self.columns.len());
        for column in &self.categorical {
            let array = encoded_column(features, &column.field)?;
            matrix.extend(column.encode(&text_values(&array, &column.field)?));
        }
        for field in &self.numeric {
            let array = encoded_column(features, field)?;
            matrix.push(numeric_values(&array, field)?);
        }
        Ok(matrix)
    }
}

fn encoded_column(batch: &RecordBatch, name: &str) -> Result<ArrayRef> {
    batch
        .column_by_name(name)
        .cloned()
        .ok_or_else(|| DashboardError::schema_fit(format!("fitted column '{name}' is missing")))
}

fn text_values(array: &ArrayRef, name: &str) -> Result<Vec<Option<String>>> {
    let values = array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            DashboardError::schema_fit(format!(
                "categorical column '{name}' is {} instead of Utf8",
                array.data_type()
            ))
        })?;
    Ok(values.iter().map(|v| v.map(str::to_string)).collect())
}

fn numeric_values(array: &ArrayRef, name: &str) -> Result<Vec<Option<f64>>> {
    if !is_numeric(array.data_type()) {
        return Err(DashboardError::schema_fit(format!(
            "numeric column '{name}' is {}",
            array.data_type()
        )));
    }
    let array = cast(array, &DataType::Float64)
        .map_err(|e| DashboardError::schema_fit(format!("column '{name}' is not numeric: {e}")))?;
    let values = array
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| DashboardError::schema_fit(format!("column '{name}' is not numeric")))?;
    Ok(values.iter().collect())
}
