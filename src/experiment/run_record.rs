//! Run Record - one recorded training attempt

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::LifecycleStage;

/// Prefix of local artifact URIs.
pub const FILE_URI_PREFIX: &str = "file://";

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is created but not yet started.
    Pending,
    /// Run is currently executing.
    Running,
    /// Run completed successfully.
    Success,
    /// Run failed with an error.
    Failed,
    /// Run was cancelled by user or system.
    Cancelled,
}

/// Run Record represents a single training attempt within an experiment.
///
/// Carries the latest value of every logged metric, the parameters and
/// tags of the attempt, and the location of its artifacts. The selector
/// only ever reads runs; mutation happens through the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    run_id: String,
    experiment_id: String,
    status: RunStatus,
    lifecycle_stage: LifecycleStage,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metrics: HashMap<String, f64>,
    #[serde(default)]
    params: HashMap<String, String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    artifact_uri: String,
}

impl RunRecord {
    /// Create a new run record in Pending status.
    ///
    /// # Arguments
    ///
    /// * `run_id` - Unique identifier for the run
    /// * `experiment_id` - ID of the parent experiment
    /// * `artifact_uri` - Location of the run's artifact directory
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        experiment_id: impl Into<String>,
        artifact_uri: impl Into<String>,
    ) -> Self {
        Self::builder(run_id, experiment_id)
            .artifact_uri(artifact_uri)
            .build()
    }

    /// Create a builder for constructing a run record with optional fields.
    #[must_use]
    pub fn builder(
        run_id: impl Into<String>,
        experiment_id: impl Into<String>,
    ) -> RunRecordBuilder {
        RunRecordBuilder::new(run_id, experiment_id)
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the lifecycle stage.
    #[must_use]
    pub const fn lifecycle_stage(&self) -> LifecycleStage {
        self.lifecycle_stage
    }

    /// Whether the run is active (not deleted).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle_stage == LifecycleStage::Active
    }

    /// Get the start timestamp, if the run has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the run has completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// All metrics (latest value per key).
    #[must_use]
    pub const fn metrics(&self) -> &HashMap<String, f64> {
        &self.metrics
    }

    /// Look up a single metric.
    #[must_use]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied()
    }

    /// All parameters.
    #[must_use]
    pub const fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// All tags.
    #[must_use]
    pub const fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    /// Look up a single tag.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Get the artifact URI.
    #[must_use]
    pub fn artifact_uri(&self) -> &str {
        &self.artifact_uri
    }

    /// Artifact directory as a filesystem path (`file://` prefix removed).
    #[must_use]
    pub fn artifact_path(&self) -> PathBuf {
        PathBuf::from(
            self.artifact_uri
                .strip_prefix(FILE_URI_PREFIX)
                .unwrap_or(&self.artifact_uri),
        )
    }

    /// Run folder: the parent of the artifact directory.
    #[must_use]
    pub fn run_folder(&self) -> Option<PathBuf> {
        self.artifact_path().parent().map(Path::to_path_buf)
    }

    /// Wall-clock duration of the run in seconds.
    ///
    /// `None` until the run has both a start and an end timestamp.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn inference_time_secs(&self) -> Option<f64> {
        let started = self.started_at?;
        let ended = self.ended_at?;
        Some((ended - started).num_milliseconds() as f64 / 1000.0)
    }

    /// Start the run, transitioning from Pending to Running.
    ///
    /// Sets the `started_at` timestamp to now.
    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Complete the run with the given final status.
    ///
    /// Sets the `ended_at` timestamp to now.
    pub fn complete(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }

    /// Record the latest value of a metric.
    pub fn log_metric(&mut self, key: impl Into<String>, value: f64) {
        self.metrics.insert(key.into(), value);
    }

    /// Record a parameter.
    pub fn log_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Set a tag.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Soft-delete the run.
    pub fn mark_deleted(&mut self) {
        self.lifecycle_stage = LifecycleStage::Deleted;
    }
}

/// Builder for `RunRecord`.
#[derive(Debug)]
#[allow(clippy::struct_field_names)]
pub struct RunRecordBuilder {
    run_id: String,
    experiment_id: String,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    metrics: HashMap<String, f64>,
    params: HashMap<String, String>,
    tags: HashMap<String, String>,
    artifact_uri: String,
}

impl RunRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(run_id: impl Into<String>, experiment_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            experiment_id: experiment_id.into(),
            status: RunStatus::Pending,
            started_at: None,
            ended_at: None,
            metrics: HashMap::new(),
            params: HashMap::new(),
            tags: HashMap::new(),
            artifact_uri: String::new(),
        }
    }

    /// Set the artifact URI.
    #[must_use]
    pub fn artifact_uri(mut self, uri: impl Into<String>) -> Self {
        self.artifact_uri = uri.into();
        self
    }

    /// Set the run status.
    #[must_use]
    pub const fn status(mut self, status: RunStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the start timestamp.
    #[must_use]
    pub const fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Set the end timestamp.
    #[must_use]
    pub const fn ended_at(mut self, ended_at: DateTime<Utc>) -> Self {
        self.ended_at = Some(ended_at);
        self
    }

    /// Add a metric.
    #[must_use]
    pub fn metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Add a parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Build the `RunRecord`.
    #[must_use]
    pub fn build(self) -> RunRecord {
        RunRecord {
            run_id: self.run_id,
            experiment_id: self.experiment_id,
            status: self.status,
            lifecycle_stage: LifecycleStage::Active,
            started_at: self.started_at,
            ended_at: self.ended_at,
            metrics: self.metrics,
            params: self.params,
            tags: self.tags,
            artifact_uri: self.artifact_uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_run_status_default() {
        let run = RunRecord::new("run-1", "exp-1", "file:///tmp/exp-1/run-1/artifacts");
        assert_eq!(run.status(), RunStatus::Pending);
        assert!(run.is_active());
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = RunRecord::new("run-1", "exp-1", "");
        run.start();
        assert_eq!(run.status(), RunStatus::Running);
        run.complete(RunStatus::Success);
        assert_eq!(run.status(), RunStatus::Success);
        assert!(run.inference_time_secs().is_some());
    }

    #[test]
    fn test_inference_time_from_timestamps() {
        let start = Utc::now();
        let run = RunRecord::builder("run-1", "exp-1")
            .started_at(start)
            .ended_at(start + Duration::milliseconds(1200))
            .build();

        let secs = run.inference_time_secs().unwrap();
        assert!((secs - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_inference_time_requires_end() {
        let run = RunRecord::builder("run-1", "exp-1")
            .started_at(Utc::now())
            .build();
        assert!(run.inference_time_secs().is_none());
    }

    #[test]
    fn test_run_folder_strips_file_prefix() {
        let run = RunRecord::new("run-1", "exp-1", "file:///data/mlruns/exp-1/run-1/artifacts");
        assert_eq!(run.artifact_path(), PathBuf::from("/data/mlruns/exp-1/run-1/artifacts"));
        assert_eq!(run.run_folder(), Some(PathBuf::from("/data/mlruns/exp-1/run-1")));
    }

    #[test]
    fn test_mark_deleted() {
        let mut run = RunRecord::new("run-1", "exp-1", "");
        run.mark_deleted();
        assert_eq!(run.lifecycle_stage(), LifecycleStage::Deleted);
        assert!(!run.is_active());
    }
}
