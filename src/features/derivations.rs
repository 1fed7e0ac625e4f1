//! The five derivation steps of the feature deriver.
//!
//! Each step reads its source column(s), appends one derived column and
//! drops what it consumed, returning a new batch.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;

use crate::config::UnclassifiedSeniority;
use crate::error::{DashboardError, Result};
use crate::features::buckets::{CarType, JobSeniority};
use crate::schema::fields::{
    AMT_ANNUITY, AMT_CREDIT, ANNUAL_PAYMENT_RATE, CLIENT_AGE, DAYS_BIRTH, DAYS_EMPLOYED,
    EMPLOYMENT_DURATION, ID_COLUMN, JOB_SENIORITY, OWN_CAR_AGE, OWN_CAR_TYPE,
};
use crate::utils::arrow::{float_values, int_values, replace_with_derived};
use crate::utils::logging::log_warning;

const DAYS_PER_YEAR: f64 = 365.0;

/// Whole years elapsed for a count of days before the application date
///
/// Days are negative in the source. Rounding is half-to-even, the rounding
/// the training data was prepared with.
fn days_to_years(days: f64) -> f64 {
    // adding 0.0 folds -0.0 into 0.0
    (-days / DAYS_PER_YEAR).round_ties_even() + 0.0
}

/// Client age in whole years from `DAYS_BIRTH`
#[must_use]
pub fn client_age(days_birth: Option<f64>) -> Option<f64> {
    days_birth.map(days_to_years)
}

/// Employment duration in whole years from `DAYS_EMPLOYED`
///
/// The not-employed sentinel comes out as `-1001` and is kept as such.
#[must_use]
pub fn employment_duration(days_employed: Option<f64>) -> Option<f64> {
    days_employed.map(days_to_years)
}

/// Yearly annuity as a share of the credit amount
///
/// `None` when either amount is missing or the ratio is not finite, which
/// covers a zero credit amount.
#[must_use]
pub fn annual_payment_rate(annuity: Option<f64>, credit: Option<f64>) -> Option<f64> {
    let rate = annuity? / credit?;
    rate.is_finite().then_some(rate)
}

/// Step 1: `CLIENT_AGE` replaces `DAYS_BIRTH`
pub fn derive_client_age(batch: &RecordBatch) -> Result<RecordBatch> {
    let ages: Float64Array = float_values(batch, DAYS_BIRTH)?
        .into_iter()
        .map(client_age)
        .collect();
    replace_with_derived(batch, &[DAYS_BIRTH], CLIENT_AGE, Arc::new(ages))
}

/// Step 2: `EMPLOYMENT_DURATION` replaces `DAYS_EMPLOYED`
pub fn derive_employment_duration(batch: &RecordBatch) -> Result<RecordBatch> {
    let durations: Float64Array = float_values(batch, DAYS_EMPLOYED)?
        .into_iter()
        .map(employment_duration)
        .collect();
    replace_with_derived(
        batch,
        &[DAYS_EMPLOYED],
        EMPLOYMENT_DURATION,
        Arc::new(durations),
    )
}

/// Step 3: `OWN_CAR_TYPE` replaces `OWN_CAR_AGE`
pub fn derive_car_type(batch: &RecordBatch) -> Result<RecordBatch> {
    let types: StringArray = float_values(batch, OWN_CAR_AGE)?
        .into_iter()
        .map(|age| Some(CarType::from_age(age).label()))
        .collect();
    replace_with_derived(batch, &[OWN_CAR_AGE], OWN_CAR_TYPE, Arc::new(types))
}

/// Step 4: `JOB_SENIORITY` replaces `EMPLOYMENT_DURATION`
///
/// Needs `CLIENT_AGE`, so it runs after step 1. Rows matching no band follow
/// `policy`.
pub fn derive_job_seniority(
    batch: &RecordBatch,
    policy: UnclassifiedSeniority,
) -> Result<RecordBatch> {
    let ages = float_values(batch, CLIENT_AGE)?;
    let durations = float_values(batch, EMPLOYMENT_DURATION)?;

    let labels: Vec<Option<JobSeniority>> = ages
        .iter()
        .zip(&durations)
        .map(|(age, duration)| JobSeniority::classify(*age, *duration))
        .collect();

    let unclassified = labels.iter().filter(|l| l.is_none()).count();
    if unclassified > 0 {
        match policy {
            UnclassifiedSeniority::Missing => log_warning(
                &format!(
                    "{unclassified} applicants match no job seniority band, leaving {JOB_SENIORITY} empty"
                ),
                None,
            ),
            UnclassifiedSeniority::Reject => {
                let row = labels.iter().position(Option::is_none).unwrap_or_default();
                let id = int_values(batch, ID_COLUMN)?
                    .get(row)
                    .copied()
                    .flatten()
                    .map_or_else(|| format!("row {row}"), |id| format!("applicant {id}"));
                return Err(DashboardError::data_access(format!(
                    "{unclassified} applicants match no job seniority band, first is {id} \
                     (age {:?}, employment duration {:?})",
                    ages[row], durations[row]
                )));
            }
        }
    }

    let labels: StringArray = labels.into_iter().map(|l| l.map(JobSeniority::label)).collect();
    replace_with_derived(
        batch,
        &[EMPLOYMENT_DURATION],
        JOB_SENIORITY,
        Arc::new(labels),
    )
}

/// Step 5: `ANNUAL_PAYMENT_RATE` replaces `AMT_ANNUITY`, keeping `AMT_CREDIT`
pub fn derive_payment_rate(batch: &RecordBatch) -> Result<RecordBatch> {
    let annuities = float_values(batch, AMT_ANNUITY)?;
    let credits = float_values(batch, AMT_CREDIT)?;

    let rates: Float64Array = annuities
        .into_iter()
        .zip(credits)
        .map(|(annuity, credit)| annual_payment_rate(annuity, credit))
        .collect();
    let rates: ArrayRef = Arc::new(rates);
    replace_with_derived(batch, &[AMT_ANNUITY], ANNUAL_PAYMENT_RATE, rates)
}
