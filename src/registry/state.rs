//! Registry state shared by the in-memory and file-backed registries

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ModelVersion, RegisteredModel};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelEntry {
    model: RegisteredModel,
    versions: BTreeMap<u32, ModelVersion>,
}

/// Models by name, each with its versions keyed by number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RegistryState {
    models: BTreeMap<String, ModelEntry>,
}

impl RegistryState {
    pub(crate) fn registered_model(&self, name: &str) -> Option<RegisteredModel> {
        self.models.get(name).map(|e| e.model.clone())
    }

    /// Returns `true` when the model was newly created.
    pub(crate) fn create_registered_model(&mut self, name: &str) -> bool {
        if self.models.contains_key(name) {
            return false;
        }
        self.models.insert(
            name.to_string(),
            ModelEntry {
                model: RegisteredModel::new(name),
                versions: BTreeMap::new(),
            },
        );
        true
    }

    pub(crate) fn create_model_version(
        &mut self,
        name: &str,
        source: &str,
        run_id: &str,
    ) -> Result<ModelVersion> {
        let entry = self.entry_mut(name)?;
        let next = entry.versions.keys().next_back().map_or(1, |v| v + 1);
        let version = ModelVersion::new(name, next, source, run_id);
        entry.versions.insert(next, version.clone());
        Ok(version)
    }

    /// Versions ordered newest first.
    pub(crate) fn latest_versions(&self, name: &str) -> Result<Vec<ModelVersion>> {
        let entry = self.entry(name)?;
        Ok(entry.versions.values().rev().cloned().collect())
    }

    pub(crate) fn version_by_alias(&self, name: &str, alias: &str) -> Option<ModelVersion> {
        let entry = self.models.get(name)?;
        let number = entry.model.alias(alias)?;
        entry.versions.get(&number).cloned()
    }

    pub(crate) fn set_alias(&mut self, name: &str, alias: &str, version: u32) -> Result<()> {
        let entry = self.entry_mut(name)?;
        if !entry.versions.contains_key(&version) {
            return Err(Error::Registry(format!(
                "Model {name} has no version {version}"
            )));
        }
        entry.model.set_alias(alias, version);
        Ok(())
    }

    pub(crate) fn set_version_tag(
        &mut self,
        name: &str,
        version: u32,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let entry = self.entry_mut(name)?;
        let model_version = entry.versions.get_mut(&version).ok_or_else(|| {
            Error::Registry(format!("Model {name} has no version {version}"))
        })?;
        model_version.set_tag(key, value);
        Ok(())
    }

    fn entry(&self, name: &str) -> Result<&ModelEntry> {
        self.models
            .get(name)
            .ok_or_else(|| Error::Registry(format!("Registered model not found: {name}")))
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut ModelEntry> {
        self.models
            .get_mut(name)
            .ok_or_else(|| Error::Registry(format!("Registered model not found: {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_monotonic() {
        let mut state = RegistryState::default();
        assert!(state.create_registered_model("m"));
        assert!(!state.create_registered_model("m"));

        let v1 = state.create_model_version("m", "runs:/a/model", "a").unwrap();
        let v2 = state.create_model_version("m", "runs:/a/model", "a").unwrap();
        assert_eq!(v1.version(), 1);
        assert_eq!(v2.version(), 2);

        let latest = state.latest_versions("m").unwrap();
        assert_eq!(latest[0].version(), 2);
    }

    #[test]
    fn test_version_on_unknown_model_fails() {
        let mut state = RegistryState::default();
        assert!(state.create_model_version("missing", "s", "r").is_err());
    }

    #[test]
    fn test_alias_requires_existing_version() {
        let mut state = RegistryState::default();
        state.create_registered_model("m");
        assert!(state.set_alias("m", "Production", 1).is_err());
        state.create_model_version("m", "s", "r").unwrap();
        state.set_alias("m", "Production", 1).unwrap();
        assert_eq!(
            state.version_by_alias("m", "Production").unwrap().version(),
            1
        );
    }
}
