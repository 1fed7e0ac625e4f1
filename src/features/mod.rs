//! Feature derivation
//!
//! Turns the raw applicant table into the derived feature set: client age,
//! car-age bucket, job-seniority bucket and annual payment rate replace the
//! raw fields they are computed from. The employment duration only exists
//! between steps 2 and 4.

pub mod buckets;
pub mod derivations;

use arrow::record_batch::RecordBatch;

use crate::config::PipelineConfig;
use crate::error::Result;

pub use buckets::{CarType, JobSeniority, NOT_EMPLOYED_DURATION};
pub use derivations::{
    annual_payment_rate, client_age, derive_car_type, derive_client_age,
    derive_employment_duration, derive_job_seniority, derive_payment_rate, employment_duration,
};

/// Run the full derivation chain over a raw applicant table
///
/// Steps run in a fixed order: job seniority reads the client age produced
/// by the first step and the duration produced by the second.
pub fn derive_features(raw: &RecordBatch, config: &PipelineConfig) -> Result<RecordBatch> {
    let batch = derive_client_age(raw)?;
    let batch = derive_employment_duration(&batch)?;
    let batch = derive_car_type(&batch)?;
    let batch = derive_job_seniority(&batch, config.unclassified_seniority)?;
    derive_payment_rate(&batch)
}
