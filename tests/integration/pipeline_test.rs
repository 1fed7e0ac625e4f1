//! End-to-end tests of the feature pipeline: derivation, encoding,
//! reconciliation and client vector extraction

use arrow::array::{Array, Float64Array};
use arrow::record_batch::RecordBatch;
use credit_dash::config::{PipelineConfig, UnclassifiedSeniority};
use credit_dash::schema::{ID_COLUMN, JOB_SENIORITY, OWN_CAR_TYPE};
use credit_dash::utils::arrow::{column_names, float_values, string_values};
use credit_dash::{DashboardError, Session};

use crate::utils::{ApplicationRow, random_rows, reference_rows, to_batch};

const MATERNITY_LEAVE: &str = "NAME_INCOME_TYPE_Maternity leave";

fn session(rows: &[ApplicationRow]) -> Session {
    Session::from_raw(to_batch(rows), &PipelineConfig::default()).unwrap()
}

fn encoded_column(table: &RecordBatch, name: &str) -> Vec<Option<f64>> {
    float_values(table, name).unwrap()
}

#[test]
fn derived_columns_replace_their_sources() {
    let session = session(&reference_rows());

    assert_eq!(
        column_names(session.derived()),
        vec![
            "SK_ID_CURR",
            "NAME_CONTRACT_TYPE",
            "CODE_GENDER",
            "FLAG_OWN_CAR",
            "FLAG_OWN_REALTY",
            "AMT_INCOME_TOTAL",
            "AMT_CREDIT",
            "NAME_INCOME_TYPE",
            "NAME_EDUCATION_TYPE",
            "NAME_FAMILY_STATUS",
            "NAME_HOUSING_TYPE",
            "CNT_FAM_MEMBERS",
            "DEF_30_CNT_SOCIAL_CIRCLE",
            "CLIENT_AGE",
            "OWN_CAR_TYPE",
            "JOB_SENIORITY",
            "ANNUAL_PAYMENT_RATE",
        ]
    );
    assert_eq!(session.feature_names().len(), 16);
}

#[test]
fn reference_applicants_land_in_expected_bands() {
    let session = session(&reference_rows());
    let derived = session.derived();

    assert_eq!(
        float_values(derived, "CLIENT_AGE").unwrap(),
        vec![Some(25.0), Some(35.0), Some(40.0), Some(50.0), Some(65.0)]
    );
    assert_eq!(
        string_values(derived, OWN_CAR_TYPE).unwrap(),
        vec![
            Some("New car".to_string()),
            Some("Young car".to_string()),
            Some("Old car".to_string()),
            Some("Very old car".to_string()),
            Some("No car".to_string()),
        ]
    );
    assert_eq!(
        string_values(derived, JOB_SENIORITY).unwrap(),
        vec![
            Some("Beginner".to_string()),
            Some("New job".to_string()),
            Some("Medium seniority".to_string()),
            Some("Long seniority".to_string()),
            Some("No job".to_string()),
        ]
    );

    let rates = float_values(derived, "ANNUAL_PAYMENT_RATE").unwrap();
    assert!((rates[0].unwrap() - 20_560.5 / 568_800.0).abs() < 1e-12);
    assert_eq!(rates[4], None);
}

#[test]
fn encoded_schema_has_one_hot_block_then_numeric_block() {
    let session = session(&reference_rows());
    let names = column_names(session.encoded());

    assert_eq!(names[0], ID_COLUMN);
    assert_eq!(
        &names[1..6],
        &[
            "NAME_CONTRACT_TYPE_Cash loans",
            "NAME_CONTRACT_TYPE_Revolving loans",
            "CODE_GENDER_F",
            "CODE_GENDER_M",
            "FLAG_OWN_CAR_N",
        ]
    );
    assert_eq!(
        &names[14..24],
        &[
            "OWN_CAR_TYPE_New car",
            "OWN_CAR_TYPE_No car",
            "OWN_CAR_TYPE_Old car",
            "OWN_CAR_TYPE_Very old car",
            "OWN_CAR_TYPE_Young car",
            "JOB_SENIORITY_Beginner",
            "JOB_SENIORITY_Long seniority",
            "JOB_SENIORITY_Medium seniority",
            "JOB_SENIORITY_New job",
            "JOB_SENIORITY_No job",
        ]
    );
    assert_eq!(
        &names[24..],
        &[
            "AMT_INCOME_TOTAL",
            "AMT_CREDIT",
            "CNT_FAM_MEMBERS",
            "DEF_30_CNT_SOCIAL_CIRCLE",
            "CLIENT_AGE",
            "ANNUAL_PAYMENT_RATE",
            MATERNITY_LEAVE,
        ]
    );
    assert_eq!(session.vector_names(), names[1..].to_vec());
}

#[test]
fn expected_columns_are_zero_filled_when_absent() {
    let session = session(&random_rows(3, 120));
    let names = column_names(session.encoded());

    assert_eq!(names.last().map(String::as_str), Some(MATERNITY_LEAVE));
    let filled = encoded_column(session.encoded(), MATERNITY_LEAVE);
    assert_eq!(filled.len(), 120);
    assert!(filled.iter().all(|v| *v == Some(0.0)));
}

#[test]
fn expected_columns_present_in_data_are_not_duplicated() {
    let mut rows = reference_rows();
    rows[2].NAME_INCOME_TYPE = "Maternity leave".to_string();
    let session = session(&rows);
    let names = column_names(session.encoded());

    assert_eq!(names.iter().filter(|n| *n == MATERNITY_LEAVE).count(), 1);
    assert_ne!(names.last().map(String::as_str), Some(MATERNITY_LEAVE));
    let indicator = encoded_column(session.encoded(), MATERNITY_LEAVE);
    assert!(indicator[2].unwrap() > 0.0);
    assert_eq!(indicator[0], Some(0.0));
}

#[test]
fn client_vector_excludes_identifier_and_keeps_nulls_as_nan() {
    let session = session(&reference_rows());
    let width = session.encoded().num_columns();

    let vector = session.client_vector(100_028).unwrap();
    assert_eq!(vector.len(), width - 1);

    let names = session.vector_names();
    let members = names.iter().position(|n| n == "CNT_FAM_MEMBERS").unwrap();
    assert!(vector[members].is_nan());

    let pensioner = session.client_vector(100_038).unwrap();
    let rate = names.iter().position(|n| n == "ANNUAL_PAYMENT_RATE").unwrap();
    assert!(pensioner[rate].is_nan());
    assert!(pensioner.iter().filter(|v| v.is_nan()).count() == 1);

    let err = session.client_vector(424_242).unwrap_err();
    assert!(matches!(err, DashboardError::NotFound(_)));
    assert!(err.is_recoverable());
}

#[test]
fn duplicate_identifiers_are_not_found() {
    let mut rows = reference_rows();
    rows[1].SK_ID_CURR = rows[0].SK_ID_CURR;
    let session = session(&rows);

    assert!(matches!(
        session.client_vector(100_001),
        Err(DashboardError::NotFound(_))
    ));
    assert!(session.client_vector(100_013).is_ok());
}

#[test]
fn one_hot_blocks_decode_to_the_derived_categories() {
    let session = session(&random_rows(42, 300));
    let encoder = session.encoder();

    for field in [OWN_CAR_TYPE, JOB_SENIORITY, "NAME_INCOME_TYPE", "CODE_GENDER"] {
        let decoded = encoder.decode_one_hot(session.encoded(), field).unwrap();
        let derived = string_values(session.derived(), field).unwrap();
        assert_eq!(decoded, derived, "field {field}");
    }

    // every applicant falls in exactly one car bucket
    let categories = encoder.categories(OWN_CAR_TYPE).unwrap();
    let indicators: Vec<Vec<Option<f64>>> = categories
        .iter()
        .map(|c| encoded_column(session.encoded(), &format!("{OWN_CAR_TYPE}_{c}")))
        .collect();
    for row in 0..session.encoded().num_rows() {
        let hot = indicators
            .iter()
            .filter(|column| column[row].is_some_and(|v| v != 0.0))
            .count();
        assert_eq!(hot, 1, "row {row}");
    }
}

#[test]
fn derived_ages_are_whole_non_negative_years() {
    let session = session(&random_rows(5, 500));
    for age in float_values(session.derived(), "CLIENT_AGE").unwrap() {
        let age = age.unwrap();
        assert!(age >= 0.0);
        assert_eq!(age.fract(), 0.0);
    }
}

#[test]
fn varying_columns_are_scaled_to_unit_deviation() {
    let session = session(&random_rows(9, 400));

    for name in ["CLIENT_AGE", "AMT_CREDIT", "CODE_GENDER_F"] {
        let values: Vec<f64> = encoded_column(session.encoded(), name)
            .into_iter()
            .flatten()
            .collect();
        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;
        let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count).sqrt();
        assert!((std - 1.0).abs() < 1e-9, "column {name} has deviation {std}");
    }
}

#[test]
fn pipeline_runs_are_idempotent() {
    let rows = random_rows(11, 250);
    let first = session(&rows);
    let second = session(&rows);

    assert_eq!(first.encoded(), second.encoded());
    assert_eq!(first.encoder(), second.encoder());
    assert_eq!(
        first.client_vector(200_017).unwrap(),
        second.client_vector(200_017).unwrap()
    );
}

#[test]
fn unclassified_seniority_follows_the_configured_policy() {
    let mut rows = reference_rows();
    // a positive day count that is not the not-employed sentinel
    rows[3].DAYS_EMPLOYED = 400;
    let batch = to_batch(&rows);

    let lenient = Session::from_raw(batch.clone(), &PipelineConfig::default()).unwrap();
    let labels = string_values(lenient.derived(), JOB_SENIORITY).unwrap();
    assert_eq!(labels[3], None);
    let decoded = lenient
        .encoder()
        .decode_one_hot(lenient.encoded(), JOB_SENIORITY)
        .unwrap();
    assert_eq!(decoded[3], None);

    let strict = PipelineConfig {
        unclassified_seniority: UnclassifiedSeniority::Reject,
        ..PipelineConfig::default()
    };
    let err = Session::from_raw(batch, &strict).unwrap_err();
    assert!(matches!(err, DashboardError::DataAccess { .. }));
    assert!(err.to_string().contains("100028"));
}

#[test]
fn zero_credit_amount_yields_a_null_rate() {
    let mut rows = reference_rows();
    rows[0].AMT_CREDIT = 0.0;
    let session = session(&rows);

    let rates = session.derived().column_by_name("ANNUAL_PAYMENT_RATE").unwrap();
    let rates = rates.as_any().downcast_ref::<Float64Array>().unwrap();
    assert!(rates.is_null(0));
}
