//! Training pipeline
//!
//! Typed stages run in sequence and recorded as one run:
//!
//! ```text
//! load -> split -> train -> evaluate -> log
//! ```
//!
//! The run carries the hyperparameters as params, test-split metrics
//! (`f1_score`, `accuracy_score`, `precision_score`, `recall_score`,
//! `roc_auc`), the `model_name` tag, and the model artifact at
//! `<artifacts>/model/model.json`.

mod logistic;

pub use logistic::{fit_logistic, LogisticFit};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::{AppConfig, HyperParameters};
use crate::data::LabeledData;
use crate::deploy::selector::{F1_METRIC, MODEL_NAME_TAG};
use crate::experiment::{RunRecord, RunRepository, RunStatus};
use crate::metrics::ClassificationReport;
use crate::model::{ChurnModel, DictVectorizer, Standardizer, MODEL_ARTIFACT_PATH};
use crate::storage::DataStore;
use crate::{Error, Result};

/// Inputs of a training pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSettings {
    /// Experiment the run is recorded under
    pub experiment_name: String,
    /// Source table
    pub data_table: String,
    /// Target column
    pub label_column: String,
    /// Columns excluded from features
    pub drop_columns: Vec<String>,
    /// Value of the `model_name` tag
    pub model_tag: String,
    /// Seed of the train/test shuffle
    pub random_state: u64,
    /// Fitting parameters
    pub hyperparameters: HyperParameters,
}

impl TrainingSettings {
    /// Derive settings from the service configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            experiment_name: config.training.experiment_name.clone(),
            data_table: config.deployment.data_table.clone(),
            label_column: config.deployment.label_column.clone(),
            drop_columns: config.deployment.drop_columns.clone(),
            model_tag: config.training.model_tag.clone(),
            random_state: config.base.random_state,
            hyperparameters: config.hyperparameters,
        }
    }
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Train and test partitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// Rows used for fitting
    pub train: LabeledData,
    /// Held-out rows
    pub test: LabeledData,
}

/// Metrics of a finished training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    /// Recorded run
    pub run_id: String,
    /// Metrics on the training split
    pub train: ClassificationReport,
    /// Metrics on the test split
    pub test: ClassificationReport,
}

/// Stage 1: pull the table and split off labels.
///
/// # Errors
///
/// Returns error if the table is missing or labels cannot be encoded.
pub fn load(data: &dyn DataStore, settings: &TrainingSettings) -> Result<LabeledData> {
    let batch = data.pull_table(&settings.data_table)?;
    let drop: Vec<&str> = settings.drop_columns.iter().map(String::as_str).collect();
    let labeled = LabeledData::from_batch(&batch, &settings.label_column, &drop)?;
    tracing::info!(rows = labeled.len(), table = %settings.data_table, "Loaded training data");
    Ok(labeled)
}

/// Stage 2: seeded shuffle, `ceil(n * test_size)` rows to test.
///
/// # Errors
///
/// Returns error if `test_size` is outside `(0, 1)` or either side would be empty.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_precision_loss)]
pub fn split(data: &LabeledData, test_size: f64, random_state: u64) -> Result<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(Error::Training(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let n = data.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::Training(format!(
            "Cannot split {n} rows with test_size {test_size}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(random_state));
    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok(Split {
        train: data.select(train_idx),
        test: data.select(test_idx),
    })
}

/// Stage 3: vectorise, standardise and fit.
///
/// # Errors
///
/// Returns error if fitting fails (for example a single-class training split).
pub fn train(data: &LabeledData, params: &HyperParameters) -> Result<ChurnModel> {
    let vectorizer = DictVectorizer::fit(&data.features);
    let raw = vectorizer.transform(&data.features);
    let standardizer = Standardizer::fit(&raw);
    let x = standardizer.transform(&raw);

    let fit = fit_logistic(&x, &data.labels, params)?;
    tracing::debug!(features = vectorizer.len(), "Fitted logistic regression");
    ChurnModel::new(vectorizer, standardizer, fit.coefficients.to_vec(), fit.intercept)
}

/// Stage 4: score a split.
///
/// # Errors
///
/// Returns error if the split holds a single class.
pub fn evaluate(model: &ChurnModel, data: &LabeledData) -> Result<ClassificationReport> {
    ClassificationReport::evaluate(&data.labels, &model.predict_proba(&data.features))
}

/// Runs the stages and records the attempt in the run repository.
pub struct TrainingPipeline<'a> {
    repository: &'a dyn RunRepository,
    data: &'a dyn DataStore,
    settings: TrainingSettings,
}

impl<'a> TrainingPipeline<'a> {
    /// Wire a pipeline to its stores.
    #[must_use]
    pub fn new(
        repository: &'a dyn RunRepository,
        data: &'a dyn DataStore,
        settings: TrainingSettings,
    ) -> Self {
        Self {
            repository,
            data,
            settings,
        }
    }

    /// Execute every stage and record a run.
    ///
    /// A failed stage marks the run `Failed` before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, or a tracking store error.
    pub fn run(&self) -> Result<TrainingReport> {
        let experiment = self
            .repository
            .get_or_create_experiment(&self.settings.experiment_name)?;
        let mut run = self.repository.create_run(experiment.experiment_id())?;
        tracing::info!(run_id = run.run_id(), experiment = %self.settings.experiment_name, "Starting model training");

        match self.execute(&mut run) {
            Ok((train_report, test_report)) => {
                run.complete(RunStatus::Success);
                self.repository.update_run(&run)?;
                tracing::info!(
                    run_id = run.run_id(),
                    f1_score = test_report.f1,
                    roc_auc = test_report.roc_auc,
                    "Training complete"
                );
                Ok(TrainingReport {
                    run_id: run.run_id().to_string(),
                    train: train_report,
                    test: test_report,
                })
            }
            Err(e) => {
                run.complete(RunStatus::Failed);
                if let Err(update) = self.repository.update_run(&run) {
                    tracing::error!(run_id = run.run_id(), error = %update, "Failed to record failed run");
                }
                tracing::error!(run_id = run.run_id(), error = %e, "Training failed");
                Err(e)
            }
        }
    }

    fn execute(&self, run: &mut RunRecord) -> Result<(ClassificationReport, ClassificationReport)> {
        let params = &self.settings.hyperparameters;
        run.log_param("max_iterations", params.max_iterations.to_string());
        run.log_param("alpha", params.alpha.to_string());
        run.log_param("test_size", params.test_size.to_string());
        run.log_param("random_state", self.settings.random_state.to_string());
        run.set_tag(MODEL_NAME_TAG, self.settings.model_tag.as_str());

        let data = load(self.data, &self.settings)?;
        let parts = split(&data, params.test_size, self.settings.random_state)?;
        let model = train(&parts.train, params)?;
        let train_report = evaluate(&model, &parts.train)?;
        let test_report = evaluate(&model, &parts.test)?;

        model.save(&run.artifact_path().join(MODEL_ARTIFACT_PATH))?;

        run.log_metric(F1_METRIC, test_report.f1);
        run.log_metric("accuracy_score", test_report.accuracy);
        run.log_metric("precision_score", test_report.precision);
        run.log_metric("recall_score", test_report.recall);
        run.log_metric("roc_auc", test_report.roc_auc);

        Ok((train_report, test_report))
    }
}
