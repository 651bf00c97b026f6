//! Batch prediction with the production model

use chrono::Utc;
use serde::Serialize;

use super::DeploymentSettings;
use crate::data::{drop_columns_from, records_from_batch, with_columns};
use crate::metrics::threshold;
use crate::model::ModelLoader;
use crate::storage::{DataStore, WriteMode};
use crate::{Error, Result};

/// Probability column appended to the prediction log.
pub const PROBABILITY_COLUMN: &str = "churn_probability";

/// Yes/no call column appended to the prediction log.
pub const PREDICTION_COLUMN: &str = "churn_prediction";

/// Timestamp column appended to the prediction log.
pub const PREDICTED_AT_COLUMN: &str = "predicted_at";

/// Outcome of a batch prediction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "PredictionResponse")]
pub enum PredictionOutcome {
    /// `rows` predictions were appended to the log.
    Saved {
        /// Rows scored
        rows: usize,
    },
    /// A step failed.
    Failed {
        /// Failure message
        error: String,
    },
}

/// JSON body describing a [`PredictionOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionResponse {
    /// Rows scored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable summary
    #[serde(rename = "Response")]
    pub response: String,
}

impl From<PredictionOutcome> for PredictionResponse {
    fn from(outcome: PredictionOutcome) -> Self {
        match outcome {
            PredictionOutcome::Saved { rows } => Self {
                rows: Some(rows),
                error: None,
                response: "The predictions have successfully been saved to database".to_string(),
            },
            PredictionOutcome::Failed { error } => Self {
                rows: None,
                response: format!("Error: {error}"),
                error: Some(error),
            },
        }
    }
}

/// Score the data table with the production model and append the results
/// to the prediction log. Never returns an error; failures are logged.
#[must_use]
pub fn run_prediction(
    loader: &dyn ModelLoader,
    data: &dyn DataStore,
    settings: &DeploymentSettings,
) -> PredictionOutcome {
    match predict_batch(loader, data, settings) {
        Ok(rows) => PredictionOutcome::Saved { rows },
        Err(e) => {
            tracing::error!(error = %e, "Batch prediction error");
            PredictionOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Score the data table and append to the prediction log; returns rows scored.
///
/// An empty table is not written.
///
/// # Errors
///
/// Returns error if no production model exists, the table is missing, or the
/// log cannot be written.
pub fn predict_batch(
    loader: &dyn ModelLoader,
    data: &dyn DataStore,
    settings: &DeploymentSettings,
) -> Result<usize> {
    let model = loader.load_registered(&settings.model_name)?.ok_or_else(|| {
        Error::Model(format!(
            "No production model registered for {}",
            settings.model_name
        ))
    })?;

    let batch = data.pull_table(&settings.data_table)?;
    if batch.num_rows() == 0 {
        tracing::info!(table = %settings.data_table, "No rows to score");
        return Ok(0);
    }

    let mut excluded: Vec<&str> = settings.drop_columns.iter().map(String::as_str).collect();
    excluded.push(&settings.label_column);
    let features = records_from_batch(&drop_columns_from(&batch, &excluded)?)?;

    let probabilities = model.predict(&features)?;
    let calls: Vec<String> = threshold(&probabilities)
        .into_iter()
        .map(|churn| (if churn { "yes" } else { "no" }).to_string())
        .collect();
    let predicted_at = vec![Utc::now().to_rfc3339(); batch.num_rows()];

    let output = with_columns(
        &batch,
        vec![(PROBABILITY_COLUMN, probabilities)],
        vec![(PREDICTION_COLUMN, calls), (PREDICTED_AT_COLUMN, predicted_at)],
    )?;
    let rows = output.num_rows();
    data.push_table(&settings.prediction_table, output, WriteMode::Append)?;

    tracing::info!(rows, table = %settings.prediction_table, "Saved predictions");
    Ok(rows)
}
