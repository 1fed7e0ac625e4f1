//! Module for checking whether source column types can be normalized.

use arrow::compute::can_cast_types;
use arrow::datatypes::DataType;

use crate::schema::fields::FieldKind;

/// Types of data type compatibility
#[derive(Debug, PartialEq, Eq)]
pub enum TypeCompatibility {
    /// Types match exactly
    Exact,
    /// Types can be cast to the target type
    Compatible,
    /// Types are incompatible
    Incompatible,
}

/// Check whether a source column of type `from` can be loaded as `kind`
#[must_use]
pub fn check_field_compatibility(from: &DataType, kind: FieldKind) -> TypeCompatibility {
    let to = kind.target_type();
    if *from == to {
        return TypeCompatibility::Exact;
    }

    let castable = match kind {
        FieldKind::Identifier => is_integer(from) || is_string(from),
        FieldKind::Numeric => is_numeric(from) || is_string(from) || *from == DataType::Null,
        FieldKind::Categorical => {
            is_string(from)
                || *from == DataType::Null
                || matches!(from, DataType::Dictionary(_, value) if is_string(value))
        }
    };

    if castable && can_cast_types(from, &to) {
        TypeCompatibility::Compatible
    } else {
        TypeCompatibility::Incompatible
    }
}

/// Identifies whether a data type is numeric
#[must_use]
pub const fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

/// Identifies whether a data type is an integer
#[must_use]
pub const fn is_integer(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Identifies whether a data type holds strings
#[must_use]
pub const fn is_string(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}
