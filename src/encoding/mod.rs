//! Categorical/numeric encoding
//!
//! One-hot encodes the categorical features and scales the whole encoded
//! matrix, producing the named and ordered numeric columns the scoring model
//! was trained on.

pub mod encoder;
pub mod one_hot;
pub mod scaler;

use std::time::Instant;

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::schema::ID_COLUMN;
use crate::utils::arrow::drop_columns;
use crate::utils::logging::log_stage_complete;

pub use encoder::FittedEncoder;
pub use one_hot::CategoricalColumn;
pub use scaler::Scaler;

/// Fit the encoder on a derived table and encode it
///
/// The identifier column is left out of both the fit and the output.
pub fn encode_features(derived: &RecordBatch) -> Result<(FittedEncoder, RecordBatch)> {
    let start = Instant::now();
    let features = drop_columns(derived, &[ID_COLUMN])?;

    let encoder = FittedEncoder::fit(&features)?;
    let encoded = encoder.transform(&features)?;

    log_stage_complete(
        "Encoded features",
        encoded.num_rows(),
        encoded.num_columns(),
        start.elapsed(),
    );
    Ok((encoder, encoded))
}
