//! File-backed run repository
//!
//! Directory layout under the tracking root:
//!
//! ```text
//! <root>/<experiment_id>/meta.json
//! <root>/<experiment_id>/<run_id>/meta.json
//! <root>/<experiment_id>/<run_id>/artifacts/...
//! ```
//!
//! Removing a run folder therefore removes both its metadata and its
//! artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::repository::{sort_experiments, sort_search_order};
use super::{
    artifact_uri_for, new_tracking_id, ExperimentRecord, RunRecord, RunRepository, ViewType,
};
use crate::{Error, Result};

const META_FILE: &str = "meta.json";

/// Run repository persisted as JSON metadata files.
#[derive(Debug, Clone)]
pub struct FileRunRepository {
    root: PathBuf,
}

impl FileRunRepository {
    /// Open (creating if needed) a repository rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns error if the root directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        let root = fs::canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    /// Tracking root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn experiment_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() && path.join(META_FILE).is_file() {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    fn run_meta_path(&self, run: &RunRecord) -> PathBuf {
        self.root
            .join(run.experiment_id())
            .join(run.run_id())
            .join(META_FILE)
    }

    fn find_run_meta(&self, run_id: &str) -> Result<Option<PathBuf>> {
        for dir in self.experiment_dirs()? {
            let candidate = dir.join(run_id).join(META_FILE);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        Error::Tracking(format!("Corrupt metadata at {}: {e}", path.display()))
    })
}

/// Write via a sibling temp file so readers never observe partial JSON.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl RunRepository for FileRunRepository {
    fn get_or_create_experiment(&self, name: &str) -> Result<ExperimentRecord> {
        if let Some(existing) = self
            .list_experiments()?
            .into_iter()
            .find(|e| e.name() == name)
        {
            return Ok(existing);
        }

        let experiment = ExperimentRecord::new(new_tracking_id(), name);
        write_json(
            &self.root.join(experiment.experiment_id()).join(META_FILE),
            &experiment,
        )?;
        tracing::info!(
            experiment_id = experiment.experiment_id(),
            name,
            "Created experiment"
        );
        Ok(experiment)
    }

    fn list_experiments(&self) -> Result<Vec<ExperimentRecord>> {
        let mut experiments = Vec::new();
        for dir in self.experiment_dirs()? {
            let meta = dir.join(META_FILE);
            let experiment: ExperimentRecord = match read_json(&meta) {
                Ok(experiment) => experiment,
                Err(e) => {
                    tracing::warn!(path = %meta.display(), error = %e, "Skipping unreadable experiment");
                    continue;
                }
            };
            if experiment.is_active() {
                experiments.push(experiment);
            }
        }
        sort_experiments(&mut experiments);
        Ok(experiments)
    }

    fn create_run(&self, experiment_id: &str) -> Result<RunRecord> {
        if !self.root.join(experiment_id).join(META_FILE).is_file() {
            return Err(Error::Tracking(format!(
                "Experiment not found: {experiment_id}"
            )));
        }

        let run_id = new_tracking_id();
        let uri = artifact_uri_for(&self.root, experiment_id, &run_id);
        let mut run = RunRecord::new(run_id, experiment_id, uri);
        run.start();
        fs::create_dir_all(run.artifact_path())?;
        write_json(&self.run_meta_path(&run), &run)?;
        Ok(run)
    }

    fn update_run(&self, run: &RunRecord) -> Result<()> {
        let path = self.run_meta_path(run);
        if !path.is_file() {
            return Err(Error::Tracking(format!("Run not found: {}", run.run_id())));
        }
        write_json(&path, run)
    }

    fn get_run(&self, run_id: &str) -> Result<Option<RunRecord>> {
        self.find_run_meta(run_id)?
            .map(|path| read_json(&path))
            .transpose()
    }

    fn search_runs(&self, experiment_id: &str, view: ViewType) -> Result<Vec<RunRecord>> {
        let dir = self.root.join(experiment_id);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let meta = entry?.path().join(META_FILE);
            if !meta.is_file() {
                continue;
            }
            let run: RunRecord = match read_json(&meta) {
                Ok(run) => run,
                Err(e) => {
                    tracing::warn!(path = %meta.display(), error = %e, "Skipping unreadable run");
                    continue;
                }
            };
            if view.matches(run.lifecycle_stage()) {
                runs.push(run);
            }
        }
        sort_search_order(&mut runs);
        Ok(runs)
    }

    fn delete_run(&self, run_id: &str) -> Result<()> {
        let path = self
            .find_run_meta(run_id)?
            .ok_or_else(|| Error::Tracking(format!("Run not found: {run_id}")))?;
        let mut run: RunRecord = read_json(&path)?;
        run.mark_deleted();
        write_json(&path, &run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::RunStatus;

    #[test]
    fn test_file_repository_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRunRepository::open(dir.path()).unwrap();

        let exp = repo.get_or_create_experiment("customer-churn").unwrap();
        let mut run = repo.create_run(exp.experiment_id()).unwrap();
        assert!(run.artifact_path().is_dir());

        run.log_metric("f1_score", 0.9);
        run.set_tag("model_name", "logistic");
        run.complete(RunStatus::Success);
        repo.update_run(&run).unwrap();

        let reopened = FileRunRepository::open(dir.path()).unwrap();
        let fetched = reopened.get_run(run.run_id()).unwrap().unwrap();
        assert_eq!(fetched.metric("f1_score"), Some(0.9));
        assert_eq!(fetched.tag("model_name"), Some("logistic"));
        assert!(fetched.inference_time_secs().is_some());
    }

    #[test]
    fn test_file_repository_experiment_reuse() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRunRepository::open(dir.path()).unwrap();

        let a = repo.get_or_create_experiment("churn").unwrap();
        let b = repo.get_or_create_experiment("churn").unwrap();
        assert_eq!(a.experiment_id(), b.experiment_id());
        assert_eq!(repo.list_experiments().unwrap().len(), 1);
    }

    #[test]
    fn test_file_repository_delete_and_prune() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRunRepository::open(dir.path()).unwrap();
        let exp = repo.get_or_create_experiment("churn").unwrap();
        let run = repo.create_run(exp.experiment_id()).unwrap();

        repo.delete_run(run.run_id()).unwrap();
        assert!(repo
            .search_runs(exp.experiment_id(), ViewType::ActiveOnly)
            .unwrap()
            .is_empty());

        let folder = run.run_folder().unwrap();
        assert!(repo.remove_artifact_dir(&folder).unwrap());
        assert!(repo.get_run(run.run_id()).unwrap().is_none());
    }

    #[test]
    fn test_file_repository_unknown_run() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRunRepository::open(dir.path()).unwrap();
        assert!(repo.get_run("missing").unwrap().is_none());
        assert!(repo.delete_run("missing").is_err());
    }

    #[test]
    fn test_file_repository_skips_unreadable_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRunRepository::open(dir.path()).unwrap();
        let exp = repo.get_or_create_experiment("churn").unwrap();
        let good = repo.create_run(exp.experiment_id()).unwrap();
        let bad = repo.create_run(exp.experiment_id()).unwrap();
        fs::write(repo.run_meta_path(&bad), "{ truncated").unwrap();

        let runs = repo
            .search_runs(exp.experiment_id(), ViewType::All)
            .unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_id(), good.run_id());

        let broken = repo.get_or_create_experiment("broken").unwrap();
        fs::write(
            repo.root().join(broken.experiment_id()).join(META_FILE),
            "not json",
        )
        .unwrap();
        let names: Vec<String> = repo
            .list_experiments()
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["churn".to_string()]);
    }
}
