//! Model registration

use crate::model::runs_uri;
use crate::registry::ModelRegistry;
use crate::Result;

/// Register the model logged by `run_id` as a new version of `model_name`.
///
/// The registered model is created first when it is absent or its lookup
/// fails. Every call appends a new version, so registering the same run
/// twice yields two versions.
///
/// # Errors
///
/// Returns error if the model cannot be created or the version cannot be
/// appended.
pub fn register_model(registry: &dyn ModelRegistry, model_name: &str, run_id: &str) -> Result<u32> {
    let source = runs_uri(run_id);

    match registry.get_registered_model(model_name) {
        Ok(Some(_)) => {}
        Ok(None) => {
            registry.create_registered_model(model_name)?;
        }
        Err(e) => {
            tracing::warn!(model = model_name, error = %e, "Registered model lookup failed, creating");
            registry.create_registered_model(model_name)?;
        }
    }

    let version = registry.create_model_version(model_name, &source, run_id)?;
    tracing::info!(
        model = model_name,
        version = version.version(),
        source = %source,
        "Registered model version"
    );
    Ok(version.version())
}
