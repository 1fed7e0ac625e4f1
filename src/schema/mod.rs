//! Module for the applicant table schema: the column whitelist, encoded
//! column naming and source compatibility checks.

pub mod compatibility;
pub mod fields;
pub mod names;

use arrow::datatypes::{DataType, Schema};

pub use compatibility::{TypeCompatibility, check_field_compatibility};
pub use fields::{
    ANNUAL_PAYMENT_RATE, CLIENT_AGE, EMPLOYMENT_DURATION, EXPECTED_MISSING_COLUMNS, FieldKind,
    FieldSpec, ID_COLUMN, JOB_SENIORITY, OWN_CAR_TYPE, WHITELIST, whitelist_field,
    whitelist_names,
};
pub use names::{encoded_column_name, scaled_column_name};

/// A report on how a source schema matches the column whitelist
#[derive(Debug)]
pub struct WhitelistReport {
    /// Whether every whitelisted column is present and loadable
    pub compatible: bool,
    /// Whitelisted columns absent from the source
    pub missing: Vec<&'static str>,
    /// Present columns whose type cannot be normalized
    pub issues: Vec<SchemaIssue>,
    /// Source columns outside the whitelist, dropped on load
    pub ignored: usize,
}

/// A column whose type cannot be normalized
#[derive(Debug)]
pub struct SchemaIssue {
    /// The offending column
    pub column: &'static str,
    /// Type found in the source
    pub found: DataType,
    /// Type the column must be loaded as
    pub expected: DataType,
}

impl WhitelistReport {
    /// Human readable summary of every problem, empty when compatible
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing columns: {}", self.missing.join(", ")));
        }
        for issue in &self.issues {
            parts.push(format!(
                "column '{}' has type {} which cannot be loaded as {}",
                issue.column, issue.found, issue.expected
            ));
        }
        parts.join("; ")
    }
}

/// Checks a source schema against the column whitelist
#[must_use]
pub fn check_whitelist(schema: &Schema) -> WhitelistReport {
    let mut missing = Vec::new();
    let mut issues = Vec::new();

    for spec in &WHITELIST {
        match schema.field_with_name(spec.name) {
            Ok(field) => {
                if check_field_compatibility(field.data_type(), spec.kind)
                    == TypeCompatibility::Incompatible
                {
                    issues.push(SchemaIssue {
                        column: spec.name,
                        found: field.data_type().clone(),
                        expected: spec.kind.target_type(),
                    });
                }
            }
            Err(_) => missing.push(spec.name),
        }
    }

    let ignored = schema
        .fields()
        .iter()
        .filter(|f| whitelist_field(f.name()).is_none())
        .count();

    WhitelistReport {
        compatible: missing.is_empty() && issues.is_empty(),
        missing,
        issues,
        ignored,
    }
}
