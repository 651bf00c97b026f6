//! Error types for churn-guard
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// churn-guard error types
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration document is missing a required section or field
    #[error("Configuration error: {0}")]
    Config(String),

    /// Run-tracking store failure (metadata read/write, unknown run)
    #[error("Tracking store error: {0}")]
    Tracking(String),

    /// Model registry failure
    #[error("Registry error: {0}")]
    Registry(String),

    /// Data store error (Parquet/Arrow tables)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Named table does not exist in the data store
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Model artifact could not be loaded or applied
    #[error("Model error: {0}")]
    Model(String),

    /// Training pipeline failure
    #[error("Training failed: {0}")]
    Training(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
