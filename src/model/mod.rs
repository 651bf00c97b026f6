//! Churn model artifacts and loading
//!
//! A model is anything that maps feature records to churn probabilities.
//! Artifacts live in a run's artifact directory at `model/model.json` and
//! are addressed either through the registry (by name, via the
//! `Production` alias) or directly by a run-scoped source locator
//! `runs:/<run_id>/<path>`.

mod churn;
mod vectorizer;

pub use churn::{ChurnModel, Standardizer};
pub use vectorizer::DictVectorizer;

use std::sync::Arc;

use crate::data::FeatureRecord;
use crate::experiment::RunRepository;
use crate::registry::{ModelRegistry, PRODUCTION_ALIAS};
use crate::{Error, Result};

/// Artifact sub-directory holding the model.
pub const MODEL_ARTIFACT_PATH: &str = "model";

/// File name of the serialised model.
pub const MODEL_FILE: &str = "model.json";

/// Scheme of run-scoped source locators.
pub const RUNS_URI_PREFIX: &str = "runs:/";

/// A fitted binary classifier.
pub trait Model: Send + Sync {
    /// Churn probability for each record, in input order.
    fn predict(&self, features: &[FeatureRecord]) -> Result<Vec<f64>>;
}

/// Resolves models from the registry or from run artifacts.
pub trait ModelLoader: Send + Sync {
    /// Load the version aliased `Production` under `name`.
    ///
    /// `Ok(None)` when the model or the alias does not exist.
    fn load_registered(&self, name: &str) -> Result<Option<Box<dyn Model>>>;

    /// Load the model behind a `runs:/<run_id>/<path>` locator.
    fn load_source(&self, source: &str) -> Result<Box<dyn Model>>;
}

/// Source locator of the model logged by `run_id`.
#[must_use]
pub fn runs_uri(run_id: &str) -> String {
    format!("{RUNS_URI_PREFIX}{run_id}/{MODEL_ARTIFACT_PATH}")
}

/// Split a `runs:/<run_id>/<path>` locator into run ID and relative path.
///
/// # Errors
///
/// Returns error if the locator does not use the `runs:/` scheme or lacks
/// a run ID.
pub fn parse_runs_uri(source: &str) -> Result<(&str, &str)> {
    let rest = source
        .strip_prefix(RUNS_URI_PREFIX)
        .ok_or_else(|| Error::Model(format!("Unsupported model source: {source}")))?;
    let (run_id, path) = rest.split_once('/').unwrap_or((rest, ""));
    if run_id.is_empty() {
        return Err(Error::Model(format!("Missing run ID in source: {source}")));
    }
    Ok((run_id, path.trim_matches('/')))
}

/// Model loader backed by the run repository and model registry.
#[derive(Clone)]
pub struct TrackingModelLoader {
    repository: Arc<dyn RunRepository>,
    registry: Arc<dyn ModelRegistry>,
}

impl TrackingModelLoader {
    /// Create a loader over the given stores.
    #[must_use]
    pub fn new(repository: Arc<dyn RunRepository>, registry: Arc<dyn ModelRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }
}

impl std::fmt::Debug for TrackingModelLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingModelLoader").finish_non_exhaustive()
    }
}

impl ModelLoader for TrackingModelLoader {
    fn load_registered(&self, name: &str) -> Result<Option<Box<dyn Model>>> {
        let Some(version) = self
            .registry
            .get_model_version_by_alias(name, PRODUCTION_ALIAS)?
        else {
            return Ok(None);
        };
        tracing::debug!(
            model = name,
            version = version.version(),
            source = version.source(),
            "Loading production model"
        );
        self.load_source(version.source()).map(Some)
    }

    fn load_source(&self, source: &str) -> Result<Box<dyn Model>> {
        let (run_id, path) = parse_runs_uri(source)?;
        let run = self
            .repository
            .get_run(run_id)?
            .ok_or_else(|| Error::Model(format!("Run not found for source {source}")))?;

        let dir = run.artifact_path().join(path);
        Ok(Box::new(ChurnModel::load(&dir)?))
    }
}
