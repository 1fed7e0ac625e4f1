//! Dashboard sessions
//!
//! A `Session` holds every table the pipeline builds for one data source,
//! together with the fitted encoder. It is built once and only read
//! afterwards. `SessionCache` keeps built sessions keyed on the source file's
//! identity and the pipeline configuration, so a changed file is rebuilt.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::config::{LoaderConfig, PipelineConfig};
use crate::encoding::{FittedEncoder, encode_features};
use crate::error::{DashboardError, Result};
use crate::features::derive_features;
use crate::loader::{load_applications, normalize_columns};
use crate::lookup::{ClientIndex, FeatureValue, feature_value, row_vector};
use crate::reconcile::reconcile;
use crate::schema::ID_COLUMN;
use crate::utils::logging::log_stage_complete;

/// The pipeline output for one data source
#[derive(Debug)]
pub struct Session {
    source: Option<PathBuf>,
    raw: RecordBatch,
    derived: RecordBatch,
    encoded: RecordBatch,
    encoder: FittedEncoder,
    index: ClientIndex,
}

impl Session {
    /// Load `path` and run the full pipeline over it
    ///
    /// # Errors
    /// Returns a `DataAccess` error if the source cannot be loaded, or a
    /// `SchemaFit` error if the encoder cannot be fitted.
    pub fn build(path: &Path, loader: &LoaderConfig, pipeline: &PipelineConfig) -> Result<Self> {
        let raw = load_applications(path, loader)?;
        let mut session = Self::from_raw(raw, pipeline)?;
        session.source = Some(path.to_path_buf());
        Ok(session)
    }

    /// Run the pipeline over an applicant table already in memory
    ///
    /// The table must contain the whitelisted columns; they are normalized
    /// the same way the loader does it.
    pub fn from_raw(raw: RecordBatch, pipeline: &PipelineConfig) -> Result<Self> {
        let raw = normalize_columns(&raw)?;

        let start = Instant::now();
        let derived = derive_features(&raw, pipeline)?;
        log_stage_complete(
            "Derived features",
            derived.num_rows(),
            derived.num_columns(),
            start.elapsed(),
        );

        let (encoder, encoded) = encode_features(&derived)?;
        let encoded = reconcile(&derived, &encoded, &pipeline.expected_columns)?;
        let index = ClientIndex::build(&derived)?;

        Ok(Self {
            source: None,
            raw,
            derived,
            encoded,
            encoder,
            index,
        })
    }

    /// Path the session was loaded from, if any
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The loaded applicant table
    #[must_use]
    pub const fn raw(&self) -> &RecordBatch {
        &self.raw
    }

    /// The derived feature table, identifier included
    #[must_use]
    pub const fn derived(&self) -> &RecordBatch {
        &self.derived
    }

    /// The reconciled encoded table, identifier first
    #[must_use]
    pub const fn encoded(&self) -> &RecordBatch {
        &self.encoded
    }

    #[must_use]
    pub const fn encoder(&self) -> &FittedEncoder {
        &self.encoder
    }

    /// Every applicant identifier, in row order
    #[must_use]
    pub fn client_ids(&self) -> &[i64] {
        self.index.ids()
    }

    /// Derived feature names, identifier excluded
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        self.derived
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .filter(|name| name != ID_COLUMN)
            .collect()
    }

    /// Names of the values in a client vector, in order
    #[must_use]
    pub fn vector_names(&self) -> Vec<String> {
        self.encoded
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .filter(|name| name != ID_COLUMN)
            .collect()
    }

    /// The encoded vector of applicant `id`
    ///
    /// # Errors
    /// Returns a `NotFound` error unless exactly one row has `id`.
    pub fn client_vector(&self, id: i64) -> Result<Vec<f64>> {
        let row = self.index.locate(id)?;
        row_vector(&self.encoded, row)
    }

    /// The derived value of `column` for applicant `id`
    ///
    /// # Errors
    /// Returns a `NotFound` error for an unknown or duplicated `id` or an
    /// unknown column.
    pub fn client_feature_value(&self, id: i64, column: &str) -> Result<FeatureValue> {
        let row = self.index.locate(id)?;
        feature_value(&self.derived, row, column)
    }
}

/// Identity of a source file and the pipeline run over it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
    pipeline: PipelineConfig,
}

impl SessionKey {
    fn for_source(path: &Path, pipeline: &PipelineConfig) -> Result<Self> {
        let path = fs::canonicalize(path).map_err(|e| {
            DashboardError::data_access_with_source("cannot resolve data source", e).with_path(path)
        })?;
        let metadata = fs::metadata(&path).map_err(|e| {
            DashboardError::data_access_with_source("cannot read data source metadata", e)
                .with_path(&path)
        })?;

        Ok(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
            path,
            pipeline: pipeline.clone(),
        })
    }
}

/// Built sessions, one per source file state and pipeline configuration
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: FxHashMap<SessionKey, Arc<Session>>,
}

impl SessionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The session for `path`, built on first request or when the file changed
    ///
    /// Sessions for older states of the same file are evicted on rebuild.
    pub fn get_or_build(
        &mut self,
        path: &Path,
        loader: &LoaderConfig,
        pipeline: &PipelineConfig,
    ) -> Result<Arc<Session>> {
        let key = SessionKey::for_source(path, pipeline)?;

        if let Some(session) = self.sessions.get(&key) {
            log::debug!("Session cache hit for {}", key.path.display());
            return Ok(Arc::clone(session));
        }

        log::debug!("Session cache miss for {}, building", key.path.display());
        let session = Arc::new(Session::build(path, loader, pipeline)?);
        self.sessions
            .retain(|cached, _| cached.path != key.path || cached.pipeline != key.pipeline);
        self.sessions.insert(key, Arc::clone(&session));
        Ok(session)
    }

    /// Number of cached sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every cached session
    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}
