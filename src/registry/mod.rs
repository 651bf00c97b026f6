//! Model Registry
//!
//! Registered models own an append-only sequence of versions and a map of
//! aliases. Each alias points at exactly one version, so a model has at
//! most one `Production` version at any time.
//!
//! ```rust
//! use churn_guard::registry::{InMemoryRegistry, ModelRegistry, PRODUCTION_ALIAS};
//!
//! # fn main() -> churn_guard::Result<()> {
//! let registry = InMemoryRegistry::new();
//! registry.create_registered_model("customerchurn")?;
//! let v1 = registry.create_model_version("customerchurn", "runs:/abc/model", "abc")?;
//! registry.set_registered_model_alias("customerchurn", PRODUCTION_ALIAS, v1.version())?;
//!
//! let prod = registry.get_model_version_by_alias("customerchurn", PRODUCTION_ALIAS)?;
//! assert_eq!(prod.map(|v| v.version()), Some(1));
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;
mod state;
mod version;

pub use file::FileRegistry;
pub use memory::InMemoryRegistry;
pub use version::{ModelVersion, RegisteredModel};

use crate::Result;

/// Alias of the deployed model version.
pub const PRODUCTION_ALIAS: &str = "Production";

/// Model registry capability interface.
///
/// Absence of a model or alias is `Ok(None)`; `Err` is reserved for
/// registry failures and operations on unknown models or versions.
pub trait ModelRegistry: Send + Sync {
    /// Fetch a registered model by name.
    fn get_registered_model(&self, name: &str) -> Result<Option<RegisteredModel>>;

    /// Create a registered model. Creating an existing name is a no-op.
    fn create_registered_model(&self, name: &str) -> Result<RegisteredModel>;

    /// Append a new version pointing at `source`.
    ///
    /// # Errors
    ///
    /// Returns error if the model is not registered.
    fn create_model_version(&self, name: &str, source: &str, run_id: &str)
        -> Result<ModelVersion>;

    /// All versions of a model, newest first.
    fn get_latest_versions(&self, name: &str) -> Result<Vec<ModelVersion>>;

    /// Version currently behind `alias`.
    fn get_model_version_by_alias(&self, name: &str, alias: &str)
        -> Result<Option<ModelVersion>>;

    /// Point `alias` at `version`, replacing any previous target.
    fn set_registered_model_alias(&self, name: &str, alias: &str, version: u32) -> Result<()>;

    /// Set a tag on one model version.
    fn set_model_version_tag(&self, name: &str, version: u32, key: &str, value: &str)
        -> Result<()>;
}
