//! Encoded column-name construction.
//!
//! Names are built directly from the field and category.

/// Separator between a categorical field and its category
pub const CATEGORY_SEPARATOR: char = '_';

/// Name of the one-hot column for `category` of `field`: `<field>_<category>`
#[must_use]
pub fn encoded_column_name(field: &str, category: &str) -> String {
    let mut name = String::with_capacity(field.len() + category.len() + 1);
    name.push_str(field);
    name.push(CATEGORY_SEPARATOR);
    name.push_str(category);
    name
}

/// Name of the scaled column for a numeric field, which is the field itself
#[must_use]
pub fn scaled_column_name(field: &str) -> String {
    field.to_string()
}
