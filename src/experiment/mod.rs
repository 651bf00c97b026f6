//! Run Tracking Schema
//!
//! Experiments group runs; each run carries its latest metrics, parameters,
//! tags and the location of its artifacts.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< RunRecord (N)
//!                              │
//!                              ├── metrics / params / tags
//!                              └── artifact_uri ── <run folder>/artifacts/model/model.json
//! ```
//!
//! Two [`RunRepository`] backends are provided: [`ExperimentStore`] keeps
//! everything in memory, [`FileRunRepository`] persists JSON metadata next
//! to the artifacts on disk.
//!
//! ## Usage
//!
//! ```rust
//! use churn_guard::experiment::{ExperimentStore, RunRepository, RunStatus, ViewType};
//!
//! # fn main() -> churn_guard::Result<()> {
//! let store = ExperimentStore::new();
//! let experiment = store.get_or_create_experiment("customer-churn")?;
//!
//! let mut run = store.create_run(experiment.experiment_id())?;
//! run.log_metric("f1_score", 0.82);
//! run.complete(RunStatus::Success);
//! store.update_run(&run)?;
//!
//! let runs = store.search_runs(experiment.experiment_id(), ViewType::ActiveOnly)?;
//! assert_eq!(runs.len(), 1);
//! # Ok(())
//! # }
//! ```

mod experiment_record;
mod file_store;
mod repository;
mod run_record;
mod store;

use serde::{Deserialize, Serialize};

pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder};
pub use file_store::FileRunRepository;
pub(crate) use file_store::write_json;
pub use repository::{RunRepository, ViewType};
pub use run_record::{RunRecord, RunRecordBuilder, RunStatus, FILE_URI_PREFIX};
pub use store::ExperimentStore;

/// Lifecycle stage of experiments and runs (soft deletion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LifecycleStage {
    /// Visible to default searches.
    #[default]
    Active,
    /// Soft-deleted.
    Deleted,
}

/// Build the artifact URI of a run under `root`.
#[must_use]
pub fn artifact_uri_for(root: &std::path::Path, experiment_id: &str, run_id: &str) -> String {
    format!(
        "{FILE_URI_PREFIX}{}",
        root.join(experiment_id)
            .join(run_id)
            .join("artifacts")
            .display()
    )
}

/// Generate a fresh tracking identifier (32 hex chars).
#[must_use]
pub fn new_tracking_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
