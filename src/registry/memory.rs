//! In-memory model registry

use std::sync::{Mutex, MutexGuard};

use super::state::RegistryState;
use super::{ModelRegistry, ModelVersion, RegisteredModel};
use crate::{Error, Result};

/// Model registry held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: Mutex<RegistryState>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Registry("Registry lock poisoned".to_string()))
    }
}

impl ModelRegistry for InMemoryRegistry {
    fn get_registered_model(&self, name: &str) -> Result<Option<RegisteredModel>> {
        Ok(self.lock()?.registered_model(name))
    }

    fn create_registered_model(&self, name: &str) -> Result<RegisteredModel> {
        let mut state = self.lock()?;
        if state.create_registered_model(name) {
            tracing::info!(model = name, "Registered model created");
        }
        state
            .registered_model(name)
            .ok_or_else(|| Error::Registry(format!("Registered model not found: {name}")))
    }

    fn create_model_version(
        &self,
        name: &str,
        source: &str,
        run_id: &str,
    ) -> Result<ModelVersion> {
        self.lock()?.create_model_version(name, source, run_id)
    }

    fn get_latest_versions(&self, name: &str) -> Result<Vec<ModelVersion>> {
        self.lock()?.latest_versions(name)
    }

    fn get_model_version_by_alias(
        &self,
        name: &str,
        alias: &str,
    ) -> Result<Option<ModelVersion>> {
        Ok(self.lock()?.version_by_alias(name, alias))
    }

    fn set_registered_model_alias(&self, name: &str, alias: &str, version: u32) -> Result<()> {
        self.lock()?.set_alias(name, alias, version)
    }

    fn set_model_version_tag(
        &self,
        name: &str,
        version: u32,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.lock()?.set_version_tag(name, version, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PRODUCTION_ALIAS;

    #[test]
    fn test_create_registered_model_idempotent() {
        let registry = InMemoryRegistry::new();
        let a = registry.create_registered_model("m").unwrap();
        let b = registry.create_registered_model("m").unwrap();
        assert_eq!(a.created_at(), b.created_at());
    }

    #[test]
    fn test_missing_model_is_none() {
        let registry = InMemoryRegistry::new();
        assert!(registry.get_registered_model("m").unwrap().is_none());
        assert!(registry
            .get_model_version_by_alias("m", PRODUCTION_ALIAS)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_alias_repoint() {
        let registry = InMemoryRegistry::new();
        registry.create_registered_model("m").unwrap();
        registry.create_model_version("m", "runs:/a/model", "a").unwrap();
        registry.create_model_version("m", "runs:/b/model", "b").unwrap();

        registry.set_registered_model_alias("m", PRODUCTION_ALIAS, 1).unwrap();
        registry.set_registered_model_alias("m", PRODUCTION_ALIAS, 2).unwrap();

        let prod = registry
            .get_model_version_by_alias("m", PRODUCTION_ALIAS)
            .unwrap()
            .unwrap();
        assert_eq!(prod.version(), 2);
        assert_eq!(prod.run_id(), "b");
    }

    #[test]
    fn test_version_tag() {
        let registry = InMemoryRegistry::new();
        registry.create_registered_model("m").unwrap();
        registry.create_model_version("m", "s", "r").unwrap();
        registry.set_model_version_tag("m", 1, "version", "1").unwrap();

        let latest = registry.get_latest_versions("m").unwrap();
        assert_eq!(latest[0].tag("version"), Some("1"));
        assert!(registry.set_model_version_tag("m", 9, "k", "v").is_err());
    }
}
