//! A Rust library for the credit decision dashboard: loading loan
//! applications, deriving and encoding the features the scoring model was
//! trained on, and requesting a client's prediction.

pub mod config;
pub mod encoding;
pub mod error;
pub mod features;
pub mod loader;
pub mod lookup;
pub mod reconcile;
pub mod report;
pub mod schema;
pub mod scoring;
pub mod session;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{DashboardConfig, LoaderConfig, PipelineConfig, ScoringConfig, UnclassifiedSeniority};
pub use error::{DashboardError, Result};
pub use session::{Session, SessionCache};

// Pipeline stages
pub use encoding::{FittedEncoder, encode_features};
pub use features::derive_features;
pub use loader::load_applications;
pub use lookup::{FeatureValue, client_vector, locate_client};
pub use reconcile::reconcile;

// Scoring and presentation
pub use report::{Decision, Distribution, ScoreBand, client_position};
pub use scoring::{Prediction, ScoringClient};

// Arrow types
pub use arrow::record_batch::RecordBatch;
