//! Utility functions for error handling
//!
//! This module provides utility functions to make error handling more convenient.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{DashboardError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
///
/// # Returns
/// * `Result<fs::File>` - The opened file or a `DataAccess` error
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(DashboardError::data_access("File not found")
            .with_path(path)
            .context(format!("Needed for {purpose}")));
    }

    if !path.is_file() {
        return Err(DashboardError::data_access("Path is not a file")
            .with_path(path)
            .context(format!("Expected a file for {purpose}")));
    }

    match fs::File::open(path) {
        Ok(file) => Ok(file),
        Err(e) => {
            let context = match e.kind() {
                io::ErrorKind::PermissionDenied => {
                    "Permission denied - check file permissions".to_string()
                }
                io::ErrorKind::NotFound => {
                    "File not found - it may have been deleted during operation".to_string()
                }
                _ => format!("Failed to open file for {purpose}"),
            };

            Err(DashboardError::data_access_with_source(context, e).with_path(path))
        }
    }
}

/// Wrap any error raised while reading a source file as a `DataAccess` error
pub fn read_failure<E>(path: &Path, what: &str) -> impl FnOnce(E) -> DashboardError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let path = path.to_path_buf();
    let what = what.to_string();
    move |e| DashboardError::data_access_with_source(format!("Failed to {what}"), e).with_path(path)
}
