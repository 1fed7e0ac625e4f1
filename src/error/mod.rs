//! Error handling for the credit dashboard.
//!
//! Errors fall into two groups. `DataAccess` and `SchemaFit` abort the
//! construction of a session, while `NotFound` and `ScoringService` only fail
//! the single client lookup that raised them.

pub mod util;

use std::path::{Path, PathBuf};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Boxed source error carried by `DataAccess`
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Specialized error type for the dashboard pipeline and scoring client
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// The data source is unreadable or lacks a whitelisted column
    #[error("Data access error: {message}{}", display_path(.path))]
    DataAccess {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<BoxError>,
    },

    /// The encoder could not be fitted or applied to the derived table
    #[error("Schema fit error: {0}")]
    SchemaFit(String),

    /// Unknown or duplicated applicant identifier, or unknown column
    #[error("Not found: {0}")]
    NotFound(String),

    /// The scoring service failed or returned something unusable
    #[error("Scoring service error: {0}")]
    ScoringService(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" ({})", p.display()))
        .unwrap_or_default()
}

impl DashboardError {
    /// Create a data access error with the given message
    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create a data access error wrapping an underlying cause
    pub fn data_access_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DataAccess {
            message: message.into(),
            path: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a schema fit error
    pub fn schema_fit(message: impl Into<String>) -> Self {
        Self::SchemaFit(message.into())
    }

    /// No row carries the requested identifier
    #[must_use]
    pub fn client_not_found(id: i64) -> Self {
        Self::NotFound(format!("no data for applicant {id}"))
    }

    /// More than one row carries the requested identifier
    #[must_use]
    pub fn duplicate_client(id: i64, count: usize) -> Self {
        Self::NotFound(format!(
            "applicant {id} matches {count} rows, identifiers must be unique"
        ))
    }

    /// The requested column does not exist in the table
    #[must_use]
    pub fn column_not_found(column: &str) -> Self {
        Self::NotFound(format!("column '{column}' does not exist"))
    }

    /// Create a scoring service error
    pub fn scoring(message: impl Into<String>) -> Self {
        Self::ScoringService(message.into())
    }

    /// Attach the path of the data source to a data access error
    #[must_use]
    pub fn with_path(self, path: impl AsRef<Path>) -> Self {
        match self {
            Self::DataAccess {
                message, source, ..
            } => Self::DataAccess {
                message,
                path: Some(path.as_ref().to_path_buf()),
                source,
            },
            other => other,
        }
    }

    /// Prefix the error message with additional context
    #[must_use]
    pub fn context(self, context: impl AsRef<str>) -> Self {
        let context = context.as_ref();
        match self {
            Self::DataAccess {
                message,
                path,
                source,
            } => Self::DataAccess {
                message: format!("{context}: {message}"),
                path,
                source,
            },
            Self::SchemaFit(msg) => Self::SchemaFit(format!("{context}: {msg}")),
            Self::NotFound(msg) => Self::NotFound(format!("{context}: {msg}")),
            Self::ScoringService(msg) => Self::ScoringService(format!("{context}: {msg}")),
            Self::Config(msg) => Self::Config(format!("{context}: {msg}")),
        }
    }

    /// Whether the error only affects a single client lookup
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::ScoringService(_))
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(error: std::io::Error) -> Self {
        Self::data_access_with_source("I/O failure", error)
    }
}

impl From<ArrowError> for DashboardError {
    fn from(error: ArrowError) -> Self {
        Self::data_access_with_source("Arrow failure", error)
    }
}

impl From<ParquetError> for DashboardError {
    fn from(error: ParquetError) -> Self {
        Self::data_access_with_source("Parquet failure", error)
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::ScoringService(format!("request timed out: {error}"))
        } else {
            Self::ScoringService(error.to_string())
        }
    }
}

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
