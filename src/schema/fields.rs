//! Column definitions for the applicant table.
//!
//! The whitelist order is canonical: the loader emits columns in this order
//! whatever the layout of the source file, which keeps the encoded schema
//! reproducible across data loads.

use arrow::datatypes::DataType;

/// Unique applicant identifier
pub const ID_COLUMN: &str = "SK_ID_CURR";

pub const NAME_CONTRACT_TYPE: &str = "NAME_CONTRACT_TYPE";
pub const CODE_GENDER: &str = "CODE_GENDER";
pub const FLAG_OWN_CAR: &str = "FLAG_OWN_CAR";
pub const FLAG_OWN_REALTY: &str = "FLAG_OWN_REALTY";
pub const AMT_INCOME_TOTAL: &str = "AMT_INCOME_TOTAL";
pub const AMT_CREDIT: &str = "AMT_CREDIT";
pub const NAME_INCOME_TYPE: &str = "NAME_INCOME_TYPE";
pub const NAME_EDUCATION_TYPE: &str = "NAME_EDUCATION_TYPE";
pub const NAME_FAMILY_STATUS: &str = "NAME_FAMILY_STATUS";
pub const NAME_HOUSING_TYPE: &str = "NAME_HOUSING_TYPE";
pub const CNT_FAM_MEMBERS: &str = "CNT_FAM_MEMBERS";
pub const DEF_30_CNT_SOCIAL_CIRCLE: &str = "DEF_30_CNT_SOCIAL_CIRCLE";
pub const DAYS_BIRTH: &str = "DAYS_BIRTH";
pub const OWN_CAR_AGE: &str = "OWN_CAR_AGE";
pub const DAYS_EMPLOYED: &str = "DAYS_EMPLOYED";
pub const AMT_ANNUITY: &str = "AMT_ANNUITY";

// Derived fields
pub const CLIENT_AGE: &str = "CLIENT_AGE";
pub const EMPLOYMENT_DURATION: &str = "EMPLOYMENT_DURATION";
pub const OWN_CAR_TYPE: &str = "OWN_CAR_TYPE";
pub const JOB_SENIORITY: &str = "JOB_SENIORITY";
pub const ANNUAL_PAYMENT_RATE: &str = "ANNUAL_PAYMENT_RATE";

/// Role of a whitelisted column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// The applicant identifier, loaded as `Int64`
    Identifier,
    /// A string-valued field, loaded as `Utf8`
    Categorical,
    /// A count or amount, loaded as `Float64`
    Numeric,
}

impl FieldKind {
    /// The Arrow type every column of this kind is normalized to
    #[must_use]
    pub const fn target_type(self) -> DataType {
        match self {
            Self::Identifier => DataType::Int64,
            Self::Categorical => DataType::Utf8,
            Self::Numeric => DataType::Float64,
        }
    }
}

/// A whitelisted source column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

/// The 17 source columns kept by the loader, in canonical order
pub const WHITELIST: [FieldSpec; 17] = [
    field(ID_COLUMN, FieldKind::Identifier),
    field(NAME_CONTRACT_TYPE, FieldKind::Categorical),
    field(CODE_GENDER, FieldKind::Categorical),
    field(FLAG_OWN_CAR, FieldKind::Categorical),
    field(FLAG_OWN_REALTY, FieldKind::Categorical),
    field(AMT_INCOME_TOTAL, FieldKind::Numeric),
    field(AMT_CREDIT, FieldKind::Numeric),
    field(NAME_INCOME_TYPE, FieldKind::Categorical),
    field(NAME_EDUCATION_TYPE, FieldKind::Categorical),
    field(NAME_FAMILY_STATUS, FieldKind::Categorical),
    field(NAME_HOUSING_TYPE, FieldKind::Categorical),
    field(CNT_FAM_MEMBERS, FieldKind::Numeric),
    field(DEF_30_CNT_SOCIAL_CIRCLE, FieldKind::Numeric),
    field(DAYS_BIRTH, FieldKind::Numeric),
    field(OWN_CAR_AGE, FieldKind::Numeric),
    field(DAYS_EMPLOYED, FieldKind::Numeric),
    field(AMT_ANNUITY, FieldKind::Numeric),
];

/// Encoded columns the scoring model was trained with that a given sample
/// may not produce, appended as zeros during reconciliation
pub const EXPECTED_MISSING_COLUMNS: [&str; 1] = ["NAME_INCOME_TYPE_Maternity leave"];

/// Look up a whitelisted column by name
#[must_use]
pub fn whitelist_field(name: &str) -> Option<&'static FieldSpec> {
    WHITELIST.iter().find(|f| f.name == name)
}

/// Names of the whitelisted columns, in canonical order
pub fn whitelist_names() -> impl Iterator<Item = &'static str> {
    WHITELIST.iter().map(|f| f.name)
}
