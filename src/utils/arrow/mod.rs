//! Arrow data handling utilities
//!
//! This module contains helpers for extracting typed columns from record
//! batches and for building the new batches each pipeline stage produces.

pub mod array_utils;
pub mod batch_ops;

// Re-export commonly used functions for convenience
pub use array_utils::{
    downcast_array, float_values, get_column, get_column_index, int_values, string_values,
};
pub use batch_ops::{column_names, drop_columns, replace_with_derived};
