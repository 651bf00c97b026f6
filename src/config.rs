//! Service configuration (YAML)
//!
//! ```yaml
//! base:
//!   random_state: 42
//! database:
//!   customer:
//!     database_path: ./data/customer
//!     prediction_logs: predictions
//!   tracking:
//!     tracking_url: file://./mlruns
//! data:
//!   process:
//!     path: ./data/processed
//! hyperparameters:
//!   max_iterations: 100
//!   alpha: 1.0
//!   test_size: 0.25
//! ```
//!
//! `deployment`, `training` and `server` are optional sections. A missing
//! file falls back to [`AppConfig::default`]; a file missing a required
//! section is a configuration error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::deploy::DeploymentSettings;
use crate::experiment::FILE_URI_PREFIX;
use crate::{Error, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "config_path";

/// Configuration file used when neither a flag nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "./configs/parameters.yaml";

/// When set to `True`, the data directory is not created on load.
pub const TESTING_ENV: &str = "TESTING";

/// Sections every configuration file must carry.
pub const REQUIRED_SECTIONS: [&str; 4] = ["base", "database", "data", "hyperparameters"];

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Seed and other global settings
    pub base: BaseConfig,
    /// Data store and tracking locations
    pub database: DatabaseConfig,
    /// Local data directories
    pub data: DataConfig,
    /// Model fitting parameters
    pub hyperparameters: HyperParameters,
    /// Deployment names
    #[serde(default)]
    pub deployment: DeploymentSection,
    /// Training run metadata
    #[serde(default)]
    pub training: TrainingSection,
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
}

/// `base` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseConfig {
    /// Seed for shuffling and splitting
    pub random_state: u64,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self { random_state: 42 }
    }
}

/// `database` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Customer data store
    pub customer: CustomerDatabase,
    /// Run tracking store
    pub tracking: TrackingDatabase,
}

/// `database.customer` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDatabase {
    /// Directory holding one Parquet file per table
    pub database_path: String,
    /// Table receiving prediction logs
    #[serde(default = "default_prediction_logs")]
    pub prediction_logs: String,
}

fn default_prediction_logs() -> String {
    "predictions".to_string()
}

impl Default for CustomerDatabase {
    fn default() -> Self {
        Self {
            database_path: "./data/customer".to_string(),
            prediction_logs: default_prediction_logs(),
        }
    }
}

/// `database.tracking` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingDatabase {
    /// `file://<dir>` or a bare directory
    pub tracking_url: String,
}

impl Default for TrackingDatabase {
    fn default() -> Self {
        Self {
            tracking_url: format!("{FILE_URI_PREFIX}./mlruns"),
        }
    }
}

/// `data` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DataConfig {
    /// Processed data location
    pub process: ProcessData,
}

/// `data.process` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessData {
    /// Directory created on load when missing
    pub path: PathBuf,
}

impl Default for ProcessData {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/processed"),
        }
    }
}

/// `hyperparameters` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperParameters {
    /// Optimizer iteration cap
    pub max_iterations: u64,
    /// L2 penalty strength
    pub alpha: f64,
    /// Fraction of rows held out for testing
    pub test_size: f64,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            alpha: 1.0,
            test_size: 0.25,
        }
    }
}

/// `deployment` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentSection {
    /// Registered model name
    pub model_name: String,
    /// Table used for training, validation and prediction
    pub data_table: String,
    /// Target column
    pub label_column: String,
    /// Columns excluded from features
    pub drop_columns: Vec<String>,
}

impl Default for DeploymentSection {
    fn default() -> Self {
        let settings = DeploymentSettings::default();
        Self {
            model_name: settings.model_name,
            data_table: settings.data_table,
            label_column: settings.label_column,
            drop_columns: settings.drop_columns,
        }
    }
}

/// `training` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSection {
    /// Experiment that training runs are recorded under
    pub experiment_name: String,
    /// Value of the `model_name` run tag
    pub model_tag: String,
}

impl Default for TrainingSection {
    fn default() -> Self {
        Self {
            experiment_name: "customer-churn".to_string(),
            model_tag: "logistic_regression".to_string(),
        }
    }
}

/// `server` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8002,
        }
    }
}

impl AppConfig {
    /// Parse and validate a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required section or `base.random_state`
    /// is missing, or a field has the wrong type.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("Invalid YAML: {e}")))?;
        validate_document(&document)?;
        serde_yaml::from_value(document).map_err(|e| Error::Config(e.to_string()))
    }

    /// Tracking root directory from `tracking_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for URL schemes other than `file://`.
    pub fn tracking_root(&self) -> Result<PathBuf> {
        local_path(&self.database.tracking.tracking_url)
    }

    /// Data store directory from `database_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for URL schemes other than `file://`.
    pub fn database_dir(&self) -> Result<PathBuf> {
        local_path(&self.database.customer.database_path)
    }

    /// Names used by deployment and prediction.
    #[must_use]
    pub fn deployment_settings(&self) -> DeploymentSettings {
        DeploymentSettings {
            model_name: self.deployment.model_name.clone(),
            data_table: self.deployment.data_table.clone(),
            label_column: self.deployment.label_column.clone(),
            drop_columns: self.deployment.drop_columns.clone(),
            prediction_table: self.database.customer.prediction_logs.clone(),
        }
    }
}

fn local_path(url: &str) -> Result<PathBuf> {
    if let Some(path) = url.strip_prefix(FILE_URI_PREFIX) {
        return Ok(PathBuf::from(path));
    }
    if url.contains("://") {
        return Err(Error::Config(format!(
            "Unsupported store URL (only file:// and plain paths): {url}"
        )));
    }
    Ok(PathBuf::from(url))
}

/// Check required sections and fields on the raw document.
///
/// # Errors
///
/// Returns [`Error::Config`] naming the first missing item.
pub fn validate_document(document: &serde_yaml::Value) -> Result<()> {
    if !document.is_mapping() {
        return Err(Error::Config("Configuration must be a mapping".to_string()));
    }
    for section in REQUIRED_SECTIONS {
        if document.get(section).is_none() {
            return Err(Error::Config(format!("Missing required section: {section}")));
        }
    }
    if document["base"].get("random_state").is_none() {
        return Err(Error::Config(
            "Missing random_state in base configuration".to_string(),
        ));
    }
    Ok(())
}

/// Resolve the configuration path: explicit, then `$config_path`, then the default.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(
        || {
            std::env::var_os(CONFIG_PATH_ENV)
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
        },
        Path::to_path_buf,
    )
}

/// Load configuration from a file.
///
/// A missing file yields the defaults. After a file is loaded, the
/// processed-data directory is created when missing unless `TESTING=True`.
///
/// # Errors
///
/// Returns [`Error::Config`] if the file cannot be read or fails validation.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = resolve_config_path(explicit);

    let yaml = match std::fs::read_to_string(&path) {
        Ok(yaml) => yaml,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Config file not found, using default configuration");
            return Ok(AppConfig::default());
        }
        Err(e) => {
            return Err(Error::Config(format!(
                "Cannot read {}: {e}",
                path.display()
            )))
        }
    };

    let config = AppConfig::from_yaml(&yaml)?;
    ensure_data_path(&config)?;
    tracing::info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

fn ensure_data_path(config: &AppConfig) -> Result<()> {
    if std::env::var(TESTING_ENV).is_ok_and(|v| v == "True") {
        return Ok(());
    }
    let path = &config.data.process.path;
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        tracing::warn!(path = %path.display(), "Created missing data path");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r"
base:
  random_state: 7
database:
  customer:
    database_path: /tmp/customer
  tracking:
    tracking_url: file:///tmp/mlruns
data:
  process:
    path: /tmp/processed
hyperparameters:
  alpha: 0.5
";

    #[test]
    fn test_from_yaml_fills_optional_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.base.random_state, 7);
        assert_eq!(config.database.customer.prediction_logs, "predictions");
        assert_eq!(config.hyperparameters.alpha, 0.5);
        assert_eq!(config.hyperparameters.max_iterations, 100);
        assert_eq!(config.deployment.model_name, "customerchurn");
        assert_eq!(config.server.port, 8002);
        assert_eq!(config.tracking_root().unwrap(), PathBuf::from("/tmp/mlruns"));
    }

    #[test]
    fn test_missing_section() {
        let yaml = "base:\n  random_state: 1\ndatabase: {}\ndata: {}\n";
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required section: hyperparameters"
        );
    }

    #[test]
    fn test_missing_random_state() {
        let yaml = "base: {}\ndatabase: {}\ndata: {}\nhyperparameters: {}\n";
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("Missing random_state"));
    }

    #[test]
    fn test_unsupported_tracking_scheme() {
        let mut config = AppConfig::default();
        config.database.tracking.tracking_url = "sqlite:///mlruns.db".to_string();
        assert!(matches!(config.tracking_root(), Err(Error::Config(_))));
    }

    #[test]
    fn test_deployment_settings_use_prediction_logs() {
        let mut config = AppConfig::default();
        config.database.customer.prediction_logs = "prediction_log".to_string();
        let settings = config.deployment_settings();
        assert_eq!(settings.prediction_table, "prediction_log");
        assert_eq!(settings.data_table, "processdata");
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_config_path(Some(Path::new("/etc/churn.yaml")));
        assert_eq!(path, PathBuf::from("/etc/churn.yaml"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
