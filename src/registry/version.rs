//! Registered model and model version records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A named model with an append-only list of versions and a set of aliases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredModel {
    name: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    aliases: BTreeMap<String, u32>,
}

impl RegisteredModel {
    /// Create an empty registered model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            aliases: BTreeMap::new(),
        }
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Alias name to version number.
    #[must_use]
    pub const fn aliases(&self) -> &BTreeMap<String, u32> {
        &self.aliases
    }

    /// Version currently behind `alias`, if any.
    #[must_use]
    pub fn alias(&self, alias: &str) -> Option<u32> {
        self.aliases.get(alias).copied()
    }

    /// Point `alias` at `version`, replacing any previous target.
    pub(crate) fn set_alias(&mut self, alias: impl Into<String>, version: u32) {
        self.aliases.insert(alias.into(), version);
    }
}

/// One immutable version of a registered model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelVersion {
    name: String,
    version: u32,
    source: String,
    run_id: String,
    #[serde(default)]
    tags: HashMap<String, String>,
    created_at: DateTime<Utc>,
}

impl ModelVersion {
    /// Create a model version.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: u32,
        source: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            source: source.into(),
            run_id: run_id.into(),
            tags: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Registered model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version number (1-based, monotonic per model).
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Source locator, e.g. `runs:/<run_id>/model`.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run that produced this version.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Version tags.
    #[must_use]
    pub const fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    /// Look up a single tag.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_version_new() {
        let v = ModelVersion::new("customerchurn", 1, "runs:/abc/model", "abc");
        assert_eq!(v.name(), "customerchurn");
        assert_eq!(v.version(), 1);
        assert_eq!(v.source(), "runs:/abc/model");
        assert_eq!(v.run_id(), "abc");
        assert!(v.tags().is_empty());
    }

    #[test]
    fn test_alias_is_single_valued() {
        let mut model = RegisteredModel::new("customerchurn");
        model.set_alias("Production", 1);
        model.set_alias("Production", 3);
        assert_eq!(model.alias("Production"), Some(3));
        assert_eq!(model.aliases().len(), 1);
    }
}
