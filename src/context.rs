//! Service context: store handles built from configuration

use std::sync::Arc;

use crate::config::AppConfig;
use crate::deploy::{run_prediction, DeploymentOutcome, DeploymentWorkflow, PredictionOutcome};
use crate::experiment::{FileRunRepository, RunRepository};
use crate::model::{ModelLoader, TrackingModelLoader};
use crate::registry::{FileRegistry, ModelRegistry};
use crate::storage::{DataStore, ParquetDataStore};
use crate::train::{TrainingPipeline, TrainingReport, TrainingSettings};
use crate::Result;

/// Explicit handles to every store the service uses.
///
/// Cheap to clone; all handles are shared.
#[derive(Clone)]
pub struct ServiceContext {
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Run tracking store
    pub repository: Arc<dyn RunRepository>,
    /// Model registry
    pub registry: Arc<dyn ModelRegistry>,
    /// Tabular data store
    pub data: Arc<dyn DataStore>,
    /// Model loader over `repository` and `registry`
    pub loader: Arc<dyn ModelLoader>,
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ServiceContext {
    /// Open the file-backed stores named in `config`.
    ///
    /// # Errors
    ///
    /// Returns error if a store location is unsupported or cannot be opened.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let tracking_root = config.tracking_root()?;
        let repository = FileRunRepository::open(&tracking_root)?;
        let registry = FileRegistry::open_in(repository.root())?;
        let data = ParquetDataStore::open(config.database_dir()?)?;

        tracing::info!(
            tracking_root = %repository.root().display(),
            data_dir = %data.dir().display(),
            "Opened stores"
        );

        Ok(Self::new(
            config,
            Arc::new(repository),
            Arc::new(registry),
            Arc::new(data),
        ))
    }

    /// Assemble a context from existing handles.
    #[must_use]
    pub fn new(
        config: AppConfig,
        repository: Arc<dyn RunRepository>,
        registry: Arc<dyn ModelRegistry>,
        data: Arc<dyn DataStore>,
    ) -> Self {
        let loader = Arc::new(TrackingModelLoader::new(
            Arc::clone(&repository),
            Arc::clone(&registry),
        ));
        Self {
            config: Arc::new(config),
            repository,
            registry,
            data,
            loader,
        }
    }

    /// Run one deployment pass.
    #[must_use]
    pub fn deploy(&self) -> DeploymentOutcome {
        let settings = self.config.deployment_settings();
        DeploymentWorkflow::new(
            self.repository.as_ref(),
            self.registry.as_ref(),
            self.loader.as_ref(),
            self.data.as_ref(),
            &settings,
        )
        .run()
    }

    /// Score the data table with the production model.
    #[must_use]
    pub fn predict(&self) -> PredictionOutcome {
        run_prediction(
            self.loader.as_ref(),
            self.data.as_ref(),
            &self.config.deployment_settings(),
        )
    }

    /// Run the training pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first failing stage's error.
    pub fn train(&self) -> Result<TrainingReport> {
        TrainingPipeline::new(
            self.repository.as_ref(),
            self.data.as_ref(),
            TrainingSettings::from_config(&self.config),
        )
        .run()
    }
}
