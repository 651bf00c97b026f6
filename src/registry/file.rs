//! File-backed model registry (one JSON document)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::state::RegistryState;
use super::{ModelRegistry, ModelVersion, RegisteredModel};
use crate::experiment::write_json;
use crate::{Error, Result};

/// Default registry document name under the tracking root.
pub const REGISTRY_FILE: &str = "registry.json";

/// Model registry persisted as a JSON document.
///
/// The whole document is rewritten after every mutation.
#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    state: Mutex<RegistryState>,
}

impl FileRegistry {
    /// Open the registry stored at `path`, starting empty if it is missing.
    ///
    /// # Errors
    ///
    /// Returns error if the document exists but cannot be parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.is_file() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes).map_err(|e| {
                Error::Registry(format!("Corrupt registry at {}: {e}", path.display()))
            })?
        } else {
            RegistryState::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Open `registry.json` under a tracking root directory.
    ///
    /// # Errors
    ///
    /// Returns error if the document exists but cannot be parsed.
    pub fn open_in(root: impl AsRef<Path>) -> Result<Self> {
        Self::open(root.as_ref().join(REGISTRY_FILE))
    }

    /// Location of the registry document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Registry("Registry lock poisoned".to_string()))
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut RegistryState) -> Result<T>) -> Result<T> {
        let mut state = self.lock()?;
        let out = f(&mut state)?;
        write_json(&self.path, &*state)?;
        Ok(out)
    }
}

impl ModelRegistry for FileRegistry {
    fn get_registered_model(&self, name: &str) -> Result<Option<RegisteredModel>> {
        Ok(self.lock()?.registered_model(name))
    }

    fn create_registered_model(&self, name: &str) -> Result<RegisteredModel> {
        self.mutate(|state| {
            if state.create_registered_model(name) {
                tracing::info!(model = name, "Registered model created");
            }
            state
                .registered_model(name)
                .ok_or_else(|| Error::Registry(format!("Registered model not found: {name}")))
        })
    }

    fn create_model_version(
        &self,
        name: &str,
        source: &str,
        run_id: &str,
    ) -> Result<ModelVersion> {
        self.mutate(|state| state.create_model_version(name, source, run_id))
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
        self.mutate(|state| state.set_alias(name, alias, version))
    }

    fn set_model_version_tag(
        &self,
        name: &str,
        version: u32,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.mutate(|state| state.set_version_tag(name, version, key, value))
    }
}
