//! Model deployment
//!
//! The promotion loop is built from small components composed by
//! [`DeploymentWorkflow`]:
//!
//! - [`selector`]: pick the best run, prune the rest
//! - [`registrar`]: register it as a new model version
//! - [`decision`]: compare it against production on validation data
//! - [`transition`]: move the `Production` alias
//!
//! [`predict`] scores fresh data with whatever is in production.

pub mod decision;
pub mod predict;
pub mod registrar;
pub mod selector;
pub mod transition;
pub mod workflow;

pub use decision::{compare_models, PromotionVerdict};
pub use predict::{predict_batch, run_prediction, PredictionOutcome};
pub use registrar::register_model;
pub use selector::{
    extract_top_model, extract_top_model_retaining, CandidateSummary, RankingKey, Selection,
};
pub use transition::{model_transition, TransitionOutcome};
pub use workflow::{load_validation_data, DeploymentOutcome, DeploymentWorkflow};

use serde::{Deserialize, Serialize};

/// Names the deployment and prediction steps work against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentSettings {
    /// Registered model name
    pub model_name: String,
    /// Table used for validation and batch prediction
    pub data_table: String,
    /// Binary yes/no target column
    pub label_column: String,
    /// Columns removed before features are built
    pub drop_columns: Vec<String>,
    /// Table receiving prediction logs
    pub prediction_table: String,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            model_name: "customerchurn".to_string(),
            data_table: "processdata".to_string(),
            label_column: "churn".to_string(),
            drop_columns: vec!["date".to_string()],
            prediction_table: "predictions".to_string(),
        }
    }
}
