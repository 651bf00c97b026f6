//! Automated deployment workflow
//!
//! ```text
//! SELECT -> REGISTER -> LOAD_VALIDATION -> COMPARE -> PROMOTE | SKIP
//! ```
//!
//! Selection keeps the run behind the current `Production` version even when
//! it loses, so production stays loadable after a skip. Calling
//! [`extract_top_model`](super::selector::extract_top_model) directly is the
//! strict path that leaves exactly one active run.
//!
//! Any step may fail; the failure is logged and returned as
//! [`DeploymentOutcome::Failed`]. [`DeploymentWorkflow::run`] never returns
//! an error.

use serde::Serialize;

use super::decision::{compare_models, PromotionVerdict};
use super::registrar::register_model;
use super::selector::extract_top_model_retaining;
use super::transition::model_transition;
use super::DeploymentSettings;
use crate::data::LabeledData;
use crate::experiment::RunRepository;
use crate::model::{runs_uri, ModelLoader};
use crate::registry::{ModelRegistry, PRODUCTION_ALIAS};
use crate::storage::DataStore;
use crate::Result;

/// Reason reported when there is nothing to deploy.
pub const REASON_NO_CANDIDATE: &str = "no candidate";

/// Reason reported when the first model is promoted without comparison.
pub const REASON_FIRST_MODEL: &str = "first model";

/// Terminal state of one workflow invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "DeploymentResponse")]
pub enum DeploymentOutcome {
    /// No active run could be ranked.
    NoCandidate,
    /// No production model existed; the new version was promoted directly.
    FirstModel {
        /// Registered version
        model_version: u32,
    },
    /// The challenger beat production and was promoted.
    Promoted {
        /// Registered version
        model_version: u32,
        /// Metrics of both models
        metrics: PromotionVerdict,
    },
    /// The challenger did not beat production.
    Skipped {
        /// Registered version
        model_version: u32,
        /// Metrics of both models
        metrics: PromotionVerdict,
    },
    /// A step failed.
    Failed {
        /// Failure message
        error: String,
    },
}

impl DeploymentOutcome {
    /// Whether a model was promoted. `None` for failures.
    #[must_use]
    pub const fn deployed(&self) -> Option<bool> {
        match self {
            Self::FirstModel { .. } | Self::Promoted { .. } => Some(true),
            Self::NoCandidate | Self::Skipped { .. } => Some(false),
            Self::Failed { .. } => None,
        }
    }

    /// Registered version, when one was created.
    #[must_use]
    pub const fn model_version(&self) -> Option<u32> {
        match self {
            Self::FirstModel { model_version }
            | Self::Promoted { model_version, .. }
            | Self::Skipped { model_version, .. } => Some(*model_version),
            Self::NoCandidate | Self::Failed { .. } => None,
        }
    }
}

/// JSON body describing a [`DeploymentOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentResponse {
    /// Whether a model was promoted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed: Option<bool>,
    /// Registered version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<u32>,
    /// Short machine-readable reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Metrics of both models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PromotionVerdict>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable summary
    #[serde(rename = "Response")]
    pub response: String,
}

impl From<DeploymentOutcome> for DeploymentResponse {
    fn from(outcome: DeploymentOutcome) -> Self {
        let deployed = outcome.deployed();
        let model_version = outcome.model_version();
        let base = Self {
            deployed,
            model_version,
            reason: None,
            metrics: None,
            error: None,
            response: String::new(),
        };

        match outcome {
            DeploymentOutcome::NoCandidate => Self {
                reason: Some(REASON_NO_CANDIDATE.to_string()),
                response: "No candidate runs found".to_string(),
                ..base
            },
            DeploymentOutcome::FirstModel { .. } => Self {
                reason: Some(REASON_FIRST_MODEL.to_string()),
                response: "Deployed".to_string(),
                ..base
            },
            DeploymentOutcome::Promoted { metrics, .. } => Self {
                metrics: Some(metrics),
                response: "Deployed".to_string(),
                ..base
            },
            DeploymentOutcome::Skipped { metrics, .. } => Self {
                metrics: Some(metrics),
                response: "Not deployed (not better than current model)".to_string(),
                ..base
            },
            DeploymentOutcome::Failed { error } => Self {
                response: format!("Error: {error}"),
                error: Some(error),
                ..base
            },
        }
    }
}

/// Pull the validation table, drop configured columns and split off labels.
///
/// # Errors
///
/// Returns error if the table is missing or the label column cannot be encoded.
pub fn load_validation_data(data: &dyn DataStore, settings: &DeploymentSettings) -> Result<LabeledData> {
    let batch = data.pull_table(&settings.data_table)?;
    let drop: Vec<&str> = settings.drop_columns.iter().map(String::as_str).collect();
    LabeledData::from_batch(&batch, &settings.label_column, &drop)
}

/// One deployment pass over explicit store handles.
pub struct DeploymentWorkflow<'a> {
    repository: &'a dyn RunRepository,
    registry: &'a dyn ModelRegistry,
    loader: &'a dyn ModelLoader,
    data: &'a dyn DataStore,
    settings: &'a DeploymentSettings,
}

impl<'a> DeploymentWorkflow<'a> {
    /// Wire a workflow to its collaborators.
    #[must_use]
    pub fn new(
        repository: &'a dyn RunRepository,
        registry: &'a dyn ModelRegistry,
        loader: &'a dyn ModelLoader,
        data: &'a dyn DataStore,
        settings: &'a DeploymentSettings,
    ) -> Self {
        Self {
            repository,
            registry,
            loader,
            data,
            settings,
        }
    }

    /// Execute the workflow to a terminal outcome.
    #[must_use]
    pub fn run(&self) -> DeploymentOutcome {
        match self.try_run() {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Deployment workflow error");
                DeploymentOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    fn try_run(&self) -> Result<DeploymentOutcome> {
        let model_name = self.settings.model_name.as_str();

        let production_run = self
            .registry
            .get_model_version_by_alias(model_name, PRODUCTION_ALIAS)?
            .map(|v| v.run_id().to_string());
        let retain: Vec<&str> = production_run.iter().map(String::as_str).collect();

        let selection = extract_top_model_retaining(self.repository, &retain)?;
        let Some(run_id) = selection.top else {
            return Ok(DeploymentOutcome::NoCandidate);
        };

        let model_version = register_model(self.registry, model_name, &run_id)?;
        let validation = load_validation_data(self.data, self.settings)?;

        let Some(production) = self.loader.load_registered(model_name)? else {
            model_transition(self.registry, model_name, &run_id, None, Some(PRODUCTION_ALIAS))?;
            tracing::info!(model_version, "First model deployed to production");
            return Ok(DeploymentOutcome::FirstModel { model_version });
        };

        let challenger = self.loader.load_source(&runs_uri(&run_id))?;
        let metrics = compare_models(production.as_ref(), challenger.as_ref(), &validation)?;

        if metrics.promote {
            model_transition(self.registry, model_name, &run_id, None, Some(PRODUCTION_ALIAS))?;
            tracing::info!(model_version, "New model deployed to production");
            Ok(DeploymentOutcome::Promoted {
                model_version,
                metrics,
            })
        } else {
            tracing::info!(model_version, "New model not deployed (not better than production)");
            Ok(DeploymentOutcome::Skipped {
                model_version,
                metrics,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ModelMetrics;

    fn verdict(promote: bool) -> PromotionVerdict {
        PromotionVerdict {
            production: ModelMetrics { f1: 0.80, roc_auc: 0.79 },
            challenger: ModelMetrics { f1: 0.85, roc_auc: 0.82 },
            promote,
        }
    }

    #[test]
    fn test_no_candidate_response() {
        let json = serde_json::to_value(DeploymentOutcome::NoCandidate).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "deployed": false,
                "reason": "no candidate",
                "Response": "No candidate runs found"
            })
        );
    }

    #[test]
    fn test_first_model_response() {
        let json = serde_json::to_value(DeploymentOutcome::FirstModel { model_version: 1 }).unwrap();
        assert_eq!(json["deployed"], true);
        assert_eq!(json["model_version"], 1);
        assert_eq!(json["reason"], "first model");
        assert!(json.get("metrics").is_none());
    }

    #[test]
    fn test_skipped_response_has_metrics() {
        let outcome = DeploymentOutcome::Skipped {
            model_version: 4,
            metrics: verdict(false),
        };
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["deployed"], false);
        assert_eq!(json["metrics"]["production"]["f1"], 0.80);
        assert_eq!(
            json["Response"],
            "Not deployed (not better than current model)"
        );
    }

    #[test]
    fn test_failed_response() {
        let outcome = DeploymentOutcome::Failed {
            error: "Table not found: processdata".to_string(),
        };
        assert_eq!(outcome.deployed(), None);
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "Table not found: processdata",
                "Response": "Error: Table not found: processdata"
            })
        );
    }
}
