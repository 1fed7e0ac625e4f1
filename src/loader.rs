//! Applicant table loading
//!
//! Reads the loan application source, restricted to the column whitelist.
//! Parquet files are read through a column projection; CSV files (the format
//! the application extracts are published in) are parsed with the whitelist
//! types taken from the header names alone.
//! Either way the result is a single record batch with the whitelisted columns
//! in canonical order and normalized types, rows in file order.

use std::io::Seek;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::ArrayRef;
use arrow::compute::{CastOptions, cast_with_options, concat_batches};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::config::LoaderConfig;
use crate::error::util::{read_failure, safe_open_file};
use crate::error::{DashboardError, Result};
use crate::schema::{WHITELIST, check_whitelist, whitelist_field, whitelist_names};
use crate::utils::logging::{log_operation_complete, log_operation_start};

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Parquet,
    Csv,
}

impl SourceFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("parquet" | "pq") => Ok(Self::Parquet),
            Some("csv") => Ok(Self::Csv),
            _ => Err(DashboardError::data_access(
                "unsupported source format, expected a .parquet or .csv file",
            )
            .with_path(path)),
        }
    }
}

/// Load the applicant table from `path`
///
/// # Errors
/// Returns a `DataAccess` error if the file cannot be read, if a whitelisted
/// column is missing, or if a column cannot be normalized to its expected type.
pub fn load_applications(path: &Path, config: &LoaderConfig) -> Result<RecordBatch> {
    let start = Instant::now();
    log_operation_start("Loading loan applications from", path);

    let batch = match SourceFormat::from_path(path)? {
        SourceFormat::Parquet => read_parquet_source(path, config)?,
        SourceFormat::Csv => read_csv_source(path, config)?,
    };
    let batch = normalize_columns(&batch).map_err(|e| e.with_path(path))?;

    log_operation_complete("loaded", path, batch.num_rows(), Some(start.elapsed()));
    Ok(batch)
}

/// Fail unless `schema` carries every whitelisted column in a loadable type
fn ensure_whitelist(schema: &Schema, path: &Path) -> Result<()> {
    let report = check_whitelist(schema);
    if report.ignored > 0 {
        log::debug!(
            "Ignoring {} columns outside the whitelist in {}",
            report.ignored,
            path.display()
        );
    }
    if report.compatible {
        Ok(())
    } else {
        Err(DashboardError::data_access(report.describe()).with_path(path))
    }
}

fn read_parquet_source(path: &Path, config: &LoaderConfig) -> Result<RecordBatch> {
    let file = safe_open_file(path, "reading loan applications")?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(read_failure(path, "read parquet metadata"))?;
    let file_schema = builder.schema().clone();
    ensure_whitelist(&file_schema, path)?;

    let mut projection: Vec<usize> = whitelist_names()
        .filter_map(|name| file_schema.index_of(name).ok())
        .collect();
    projection.sort_unstable();

    let mask = ProjectionMask::roots(builder.parquet_schema(), projection);
    let reader = builder
        .with_projection(mask)
        .with_batch_size(config.batch_size)
        .build()
        .map_err(read_failure(path, "build parquet reader"))?;

    let schema = reader.schema();
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(read_failure(path, "read record batch"))?;

    concat(&schema, &batches, path)
}

fn read_csv_source(path: &Path, config: &LoaderConfig) -> Result<RecordBatch> {
    let mut file = safe_open_file(path, "reading loan applications")?;

    let format = Format::default().with_header(true);
    let (header, _) = format
        .infer_schema(&mut file, Some(0))
        .map_err(read_failure(path, "read csv header"))?;
    let schema = csv_read_schema(&header);
    ensure_whitelist(&schema, path)?;
    file.rewind()?;

    let projection: Vec<usize> = whitelist_names()
        .filter_map(|name| schema.index_of(name).ok())
        .collect();

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_format(format)
        .with_batch_size(config.batch_size)
        .with_projection(projection)
        .build(file)
        .map_err(read_failure(path, "build csv reader"))?;

    let schema = reader.schema();
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(read_failure(path, "read csv records"))?;

    concat(&schema, &batches, path)
}

/// Schema for parsing a CSV file with the given header
///
/// Whitelisted columns are parsed directly as their target type, every other
/// column as text. No column type depends on the values in the file.
fn csv_read_schema(header: &Schema) -> Schema {
    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|field| {
            let data_type = whitelist_field(field.name())
                .map_or(DataType::Utf8, |spec| spec.kind.target_type());
            Field::new(field.name(), data_type, true)
        })
        .collect();
    Schema::new(fields)
}

fn concat(schema: &SchemaRef, batches: &[RecordBatch], path: &Path) -> Result<RecordBatch> {
    concat_batches(schema, batches).map_err(read_failure(path, "combine record batches"))
}

/// Reorder to the canonical whitelist order and cast every column to the
/// type of its field kind
///
/// Casting is strict: a value that cannot be represented in the target type
/// is an error instead of a silent null.
pub fn normalize_columns(batch: &RecordBatch) -> Result<RecordBatch> {
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };

    let mut fields = Vec::with_capacity(WHITELIST.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(WHITELIST.len());

    for spec in &WHITELIST {
        let idx = batch.schema().index_of(spec.name).map_err(|_| {
            DashboardError::data_access(format!("whitelisted column '{}' is missing", spec.name))
        })?;
        let column = batch.column(idx);
        let target = spec.kind.target_type();

        let column = if *column.data_type() == target {
            column.clone()
        } else {
            log::debug!(
                "Converting column '{}' from {} to {}",
                spec.name,
                column.data_type(),
                target
            );
            cast_with_options(column, &target, &options).map_err(|e| {
                DashboardError::data_access_with_source(
                    format!("column '{}' cannot be loaded as {target}", spec.name),
                    e,
                )
            })?
        };

        fields.push(Field::new(spec.name, target, true));
        columns.push(column);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .map_err(|e| DashboardError::data_access_with_source("failed to assemble applicant table", e))
}
