//! Experiment Store - in-memory storage for run tracking data
//!
//! Backed by `DashMap` so a single store can be shared between the HTTP
//! handlers and the workflow without an outer lock.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

use super::repository::{sort_experiments, sort_search_order};
use super::{
    artifact_uri_for, new_tracking_id, ExperimentRecord, RunRecord, RunRepository, ViewType,
};
use crate::{Error, Result};

/// In-memory store for run tracking data.
///
/// Metadata lives in memory; artifact URIs still point at `artifact_root`
/// on disk so that model artifacts can be written and folders pruned.
#[derive(Debug)]
pub struct ExperimentStore {
    experiments: DashMap<String, ExperimentRecord>,
    runs: DashMap<String, RunRecord>,
    artifact_root: PathBuf,
}

impl Default for ExperimentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentStore {
    /// Create a new empty experiment store rooted at `./mlruns`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_artifact_root("mlruns")
    }

    /// Create a new empty store whose run artifacts live under `root`.
    #[must_use]
    pub fn with_artifact_root(root: impl AsRef<Path>) -> Self {
        Self {
            experiments: DashMap::new(),
            runs: DashMap::new(),
            artifact_root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory of run artifacts.
    #[must_use]
    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    /// Check if the store is empty (no experiments or runs).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty() && self.runs.is_empty()
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Get the number of runs in the store, deleted ones included.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Add an experiment to the store.
    pub fn add_experiment(&self, experiment: ExperimentRecord) {
        self.experiments
            .insert(experiment.experiment_id().to_string(), experiment);
    }

    /// Get an experiment by ID.
    #[must_use]
    pub fn get_experiment(&self, experiment_id: &str) -> Option<ExperimentRecord> {
        self.experiments.get(experiment_id).map(|e| e.value().clone())
    }

    /// Add a fully-formed run to the store.
    pub fn add_run(&self, run: RunRecord) {
        self.runs.insert(run.run_id().to_string(), run);
    }
}

impl RunRepository for ExperimentStore {
    fn get_or_create_experiment(&self, name: &str) -> Result<ExperimentRecord> {
        let existing = self
            .experiments
            .iter()
            .find(|e| e.is_active() && e.name() == name)
            .map(|e| e.value().clone());

        if let Some(experiment) = existing {
            return Ok(experiment);
        }

        let experiment = ExperimentRecord::new(new_tracking_id(), name);
        self.add_experiment(experiment.clone());
        tracing::info!(
            experiment_id = experiment.experiment_id(),
            name,
            "Created experiment"
        );
        Ok(experiment)
    }

    fn list_experiments(&self) -> Result<Vec<ExperimentRecord>> {
        let mut experiments: Vec<ExperimentRecord> = self
            .experiments
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.value().clone())
            .collect();
        sort_experiments(&mut experiments);
        Ok(experiments)
    }

    fn create_run(&self, experiment_id: &str) -> Result<RunRecord> {
        if !self.experiments.contains_key(experiment_id) {
            return Err(Error::Tracking(format!(
                "Experiment not found: {experiment_id}"
            )));
        }

        let run_id = new_tracking_id();
        let uri = artifact_uri_for(&self.artifact_root, experiment_id, &run_id);
        let mut run = RunRecord::new(run_id, experiment_id, uri);
        run.start();
        self.add_run(run.clone());
        Ok(run)
    }

    fn update_run(&self, run: &RunRecord) -> Result<()> {
        if !self.runs.contains_key(run.run_id()) {
            return Err(Error::Tracking(format!("Run not found: {}", run.run_id())));
        }
        self.add_run(run.clone());
        Ok(())
    }

    fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>> {
        Ok(self.runs.get(run_id).map(|r| r.value().clone()))
    }

    fn search_runs(&self, experiment_id: &str, view: ViewType) -> Result<Vec<RunRecord>> {
        let mut runs: Vec<RunRecord> = self
            .runs
            .iter()
            .filter(|r| r.experiment_id() == experiment_id && view.matches(r.lifecycle_stage()))
            .map(|r| r.value().clone())
            .collect();
        sort_search_order(&mut runs);
        Ok(runs)
    }

    fn delete_run(&self, run_id: &str) -> Result<()> {
        let mut run = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| Error::Tracking(format!("Run not found: {run_id}")))?;
        run.mark_deleted();
        tracing::debug!(run_id, "Soft-deleted run");
        Ok(())
    }
}
