//! Run repository capability interface

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ExperimentRecord, LifecycleStage, RunRecord};
use crate::Result;

/// Which runs a search returns, by lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ViewType {
    /// Only runs that have not been deleted.
    #[default]
    ActiveOnly,
    /// Only soft-deleted runs.
    DeletedOnly,
    /// Every run regardless of stage.
    All,
}

impl ViewType {
    /// Whether a record in `stage` is visible under this view.
    #[must_use]
    pub fn matches(self, stage: LifecycleStage) -> bool {
        match self {
            Self::ActiveOnly => stage == LifecycleStage::Active,
            Self::DeletedOnly => stage == LifecycleStage::Deleted,
            Self::All => true,
        }
    }
}

/// Run-tracking store: experiments, runs, and their artifact storage.
///
/// All calls are blocking. Lookups that can legitimately find nothing
/// return `Option`; `Err` is reserved for store failures.
pub trait RunRepository: Send + Sync {
    /// Get the active experiment with `name`, creating it if absent.
    fn get_or_create_experiment(&self, name: &str) -> Result<ExperimentRecord>;

    /// List active experiments in discovery order.
    fn list_experiments(&self) -> Result<Vec<ExperimentRecord>>;

    /// Create and start a run under `experiment_id`.
    ///
    /// The returned run has a fresh ID, `Running` status and an artifact
    /// URI under the store's artifact root.
    fn create_run(&self, experiment_id: &str) -> Result<RunRecord>;

    /// Persist the current state of a run (metrics, params, tags, end time).
    fn update_run(&self, run: &RunRecord) -> Result<()>;

    /// Fetch a run by ID.
    fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>>;

    /// Runs of one experiment visible under `view`.
    ///
    /// Ordered by start time (newest first), then run ID.
    fn search_runs(&self, experiment_id: &str, view: ViewType) -> Result<Vec<RunRecord>>;

    /// Soft-delete a run.
    ///
    /// # Errors
    ///
    /// Returns error if the run does not exist.
    fn delete_run(&self, run_id: &str) -> Result<()>;

    /// Remove a run's folder from artifact storage.
    ///
    /// Returns `false` when the directory was already gone.
    fn remove_artifact_dir(&self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(path)?;
        Ok(true)
    }
}

/// Sort runs into repository search order.
pub(crate) fn sort_search_order(runs: &mut [RunRecord]) {
    runs.sort_by(|a, b| {
        b.started_at()
            .cmp(&a.started_at())
            .then_with(|| a.run_id().cmp(b.run_id()))
    });
}

/// Sort experiments into discovery order (oldest first).
pub(crate) fn sort_experiments(experiments: &mut [ExperimentRecord]) {
    experiments.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.experiment_id().cmp(b.experiment_id()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_view_type_matches() {
        assert!(ViewType::ActiveOnly.matches(LifecycleStage::Active));
        assert!(!ViewType::ActiveOnly.matches(LifecycleStage::Deleted));
        assert!(ViewType::DeletedOnly.matches(LifecycleStage::Deleted));
        assert!(ViewType::All.matches(LifecycleStage::Active));
        assert!(ViewType::All.matches(LifecycleStage::Deleted));
    }

    #[test]
    fn test_search_order_newest_first() {
        let now = Utc::now();
        let mut runs = vec![
            RunRecord::builder("a", "e").started_at(now - Duration::seconds(10)).build(),
            RunRecord::builder("b", "e").started_at(now).build(),
            RunRecord::builder("c", "e").started_at(now).build(),
        ];

        sort_search_order(&mut runs);

        let ids: Vec<_> = runs.iter().map(RunRecord::run_id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_remove_artifact_dir_missing_is_false() {
        struct Nothing;
        impl RunRepository for Nothing {
            fn get_or_create_experiment(&self, name: &str) -> Result<ExperimentRecord> {
                Ok(ExperimentRecord::new("0", name))
            }
            fn list_experiments(&self) -> Result<Vec<ExperimentRecord>> {
                Ok(Vec::new())
            }
            fn create_run(&self, experiment_id: &str) -> Result<RunRecord> {
                Ok(RunRecord::new("r", experiment_id, ""))
            }
            fn update_run(&self, _run: &RunRecord) -> Result<()> {
                Ok(())
            }
            fn get_run(&self, _run_id: &str) -> Result<Option<RunRecord>> {
                Ok(None)
            }
            fn search_runs(&self, _id: &str, _view: ViewType) -> Result<Vec<RunRecord>> {
                Ok(Vec::new())
            }
            fn delete_run(&self, _run_id: &str) -> Result<()> {
                Ok(())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(!Nothing.remove_artifact_dir(&missing).unwrap());

        let present = dir.path().join("present");
        std::fs::create_dir_all(present.join("artifacts")).unwrap();
        assert!(Nothing.remove_artifact_dir(&present).unwrap());
        assert!(!present.exists());
    }
}
