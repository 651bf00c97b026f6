//! Top-run selection
//!
//! Ranks every active run by `f1_score` (descending) then inference time
//! (ascending), keeps the best one and prunes the rest from both the run
//! repository and artifact storage.

use std::cmp::Ordering;

use serde::Serialize;

use crate::experiment::{RunRecord, RunRepository, ViewType};
use crate::{Error, Result};

/// Metric the selector ranks on first.
pub const F1_METRIC: &str = "f1_score";

/// Tag naming the estimator that produced a run.
pub const MODEL_NAME_TAG: &str = "model_name";

/// Composite ordering key of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankingKey {
    /// Primary key, higher is better
    pub f1_score: f64,
    /// Secondary key in seconds, lower is better
    pub inference_time: f64,
}

impl RankingKey {
    /// Extract the key from a run; a missing `f1_score` counts as zero.
    ///
    /// # Errors
    ///
    /// Returns error if the run has no end time (latency is undefined).
    pub fn from_run(run: &RunRecord) -> Result<Self> {
        let inference_time = run.inference_time_secs().ok_or_else(|| {
            Error::InvalidInput(format!("Run {} has not finished", run.run_id()))
        })?;
        Ok(Self {
            f1_score: run.metric(F1_METRIC).unwrap_or(0.0),
            inference_time,
        })
    }

    /// `Less` when `self` ranks ahead of `other`.
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .f1_score
            .total_cmp(&self.f1_score)
            .then_with(|| self.inference_time.total_cmp(&other.inference_time))
    }
}

/// Summary of one candidate run, as reported by a selection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    /// Run ID
    pub run_id: String,
    /// Owning experiment
    pub experiment_id: String,
    /// F1 on the test split
    pub f1_score: f64,
    /// Accuracy on the test split
    pub accuracy_score: f64,
    /// Precision on the test split
    pub precision_score: f64,
    /// Recall on the test split
    pub recall_score: f64,
    /// Run latency in seconds
    pub inference_time: f64,
    /// Value of the `model_name` tag, `"unknown"` when absent
    pub model_name: String,
    /// Artifact location
    pub artifact_uri: String,
}

impl CandidateSummary {
    /// Summarise a run.
    ///
    /// # Errors
    ///
    /// Returns error if the ranking key cannot be extracted.
    pub fn from_run(run: &RunRecord) -> Result<Self> {
        let key = RankingKey::from_run(run)?;
        let metric = |name: &str| run.metric(name).unwrap_or(0.0);
        Ok(Self {
            run_id: run.run_id().to_string(),
            experiment_id: run.experiment_id().to_string(),
            f1_score: key.f1_score,
            accuracy_score: metric("accuracy_score"),
            precision_score: metric("precision_score"),
            recall_score: metric("recall_score"),
            inference_time: key.inference_time,
            model_name: run.tag(MODEL_NAME_TAG).unwrap_or("unknown").to_string(),
            artifact_uri: run.artifact_uri().to_string(),
        })
    }

    /// Ranking key of this candidate.
    #[must_use]
    pub const fn key(&self) -> RankingKey {
        RankingKey {
            f1_score: self.f1_score,
            inference_time: self.inference_time,
        }
    }
}

/// Order candidates best-first. Equal keys keep their input order.
pub fn rank_candidates(candidates: &mut [CandidateSummary]) {
    candidates.sort_by(|a, b| a.key().rank_cmp(&b.key()));
}

/// Result of one selection pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    /// Retained run, `None` when there were no candidates
    pub top: Option<String>,
    /// Candidates best-first
    pub candidates: Vec<CandidateSummary>,
    /// Losing runs removed from the repository
    pub pruned: usize,
    /// Runs skipped because no ranking key could be extracted
    pub skipped: usize,
    /// Losing runs kept because they were listed as retained
    pub retained: usize,
}

impl Selection {
    /// Selected run IDs: one element, or empty when nothing qualified.
    #[must_use]
    pub fn run_ids(&self) -> Vec<String> {
        self.top.iter().cloned().collect()
    }
}

/// Select the best run across all experiments and prune the others.
///
/// Runs that cannot be ranked are left untouched. Failure to delete an
/// individual loser is logged and does not stop the pass.
///
/// # Errors
///
/// Returns error if experiments or runs cannot be enumerated.
pub fn extract_top_model(repository: &dyn RunRepository) -> Result<Selection> {
    extract_top_model_retaining(repository, &[])
}

/// [`extract_top_model`], except losers whose ID is in `retain` are kept.
///
/// The deployment workflow retains the run behind the current `Production`
/// version so its artifact stays loadable.
///
/// # Errors
///
/// Returns error if experiments or runs cannot be enumerated.
pub fn extract_top_model_retaining(
    repository: &dyn RunRepository,
    retain: &[&str],
) -> Result<Selection> {
    let mut candidates = Vec::new();
    let mut runs = Vec::new();
    let mut skipped = 0;

    for experiment in repository.list_experiments()? {
        for run in repository.search_runs(experiment.experiment_id(), ViewType::ActiveOnly)? {
            match CandidateSummary::from_run(&run) {
                Ok(candidate) => {
                    candidates.push(candidate);
                    runs.push(run);
                }
                Err(e) => {
                    tracing::error!(run_id = run.run_id(), error = %e, "Skipping run");
                    skipped += 1;
                }
            }
        }
    }

    if candidates.is_empty() {
        tracing::info!(skipped, "No candidate runs found");
        return Ok(Selection {
            skipped,
            ..Selection::default()
        });
    }

    rank_candidates(&mut candidates);
    let top = candidates[0].run_id.clone();

    let mut pruned = 0;
    let mut retained = 0;
    for run in runs.iter().filter(|r| r.run_id() != top) {
        if retain.contains(&run.run_id()) {
            tracing::info!(run_id = run.run_id(), "Retaining run");
            retained += 1;
        } else if prune_run(repository, run) {
            pruned += 1;
        }
    }

    tracing::info!(
        run_id = %top,
        f1_score = candidates[0].f1_score,
        inference_time = candidates[0].inference_time,
        pruned,
        retained,
        "Selected top run"
    );

    Ok(Selection {
        top: Some(top),
        candidates,
        pruned,
        skipped,
        retained,
    })
}

/// Delete a run and remove its folder; `true` if the repository delete succeeded.
fn prune_run(repository: &dyn RunRepository, run: &RunRecord) -> bool {
    if let Err(e) = repository.delete_run(run.run_id()) {
        tracing::error!(run_id = run.run_id(), error = %e, "Failed to delete run");
        return false;
    }

    if let Some(folder) = run.run_folder() {
        match repository.remove_artifact_dir(&folder) {
            Ok(true) => tracing::debug!(run_id = run.run_id(), path = %folder.display(), "Removed run folder"),
            Ok(false) => tracing::warn!(run_id = run.run_id(), path = %folder.display(), "Run folder already gone"),
            Err(e) => tracing::error!(run_id = run.run_id(), error = %e, "Failed to remove run folder"),
        }
    }
    true
}
