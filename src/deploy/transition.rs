//! Stage transitions via registry aliases

use serde::Serialize;

use crate::registry::{ModelRegistry, PRODUCTION_ALIAS};
use crate::{Error, Result};

/// Tag written on a version when it first becomes `Production`.
pub const VERSION_TAG: &str = "version";

/// What a transition call changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// No production alias existed; the latest version became `Production`.
    Bootstrapped {
        /// Version now aliased `Production`
        version: u32,
    },
    /// `stage` now points at the latest version.
    Moved {
        /// Alias that was re-pointed
        stage: String,
        /// Version it points at
        version: u32,
    },
    /// Production alias present and no target stage: nothing changed.
    Unchanged,
}

/// Move stage aliases of `model_name`.
///
/// - No `Production` alias: alias the latest version `Production` and tag it
///   `version=<n>`.
/// - Alias present and `new_stage` given: point `new_stage` at the latest
///   version, whichever run produced it.
/// - Otherwise nothing changes.
///
/// `run_id` and `current_stage` are recorded in the log only.
///
/// # Errors
///
/// Returns error if the model has no versions or the registry rejects the
/// update.
pub fn model_transition(
    registry: &dyn ModelRegistry,
    model_name: &str,
    run_id: &str,
    current_stage: Option<&str>,
    new_stage: Option<&str>,
) -> Result<TransitionOutcome> {
    let production = registry.get_model_version_by_alias(model_name, PRODUCTION_ALIAS)?;

    let outcome = match (production, new_stage) {
        (None, _) => {
            let latest = latest_version(registry, model_name)?;
            registry.set_model_version_tag(model_name, latest, VERSION_TAG, &latest.to_string())?;
            registry.set_registered_model_alias(model_name, PRODUCTION_ALIAS, latest)?;
            TransitionOutcome::Bootstrapped { version: latest }
        }
        (Some(_), Some(stage)) => {
            let latest = latest_version(registry, model_name)?;
            registry.set_registered_model_alias(model_name, stage, latest)?;
            TransitionOutcome::Moved {
                stage: stage.to_string(),
                version: latest,
            }
        }
        (Some(_), None) => TransitionOutcome::Unchanged,
    };

    tracing::info!(
        model = model_name,
        run_id,
        current_stage = current_stage.unwrap_or("None"),
        new_stage = new_stage.unwrap_or("None"),
        ?outcome,
        "Model transition"
    );
    Ok(outcome)
}

fn latest_version(registry: &dyn ModelRegistry, model_name: &str) -> Result<u32> {
    registry
        .get_latest_versions(model_name)?
        .first()
        .map(|v| v.version())
        .ok_or_else(|| Error::Registry(format!("Model {model_name} has no versions")))
}
