//! HTTP request handlers
//!
//! Workflows are blocking; they run on tokio's blocking pool.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::ServiceContext;
use crate::deploy::{DeploymentOutcome, PredictionOutcome};

/// Liveness body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"`
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Run the deployment workflow.
pub async fn deploy_auto(State(context): State<ServiceContext>) -> Json<DeploymentOutcome> {
    let outcome = tokio::task::spawn_blocking(move || context.deploy())
        .await
        .unwrap_or_else(|e| DeploymentOutcome::Failed {
            error: format!("Deployment task failed: {e}"),
        });
    Json(outcome)
}

/// Score the data table with the production model.
pub async fn predict(State(context): State<ServiceContext>) -> Json<PredictionOutcome> {
    let outcome = tokio::task::spawn_blocking(move || context.predict())
        .await
        .unwrap_or_else(|e| PredictionOutcome::Failed {
            error: format!("Prediction task failed: {e}"),
        });
    Json(outcome)
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
