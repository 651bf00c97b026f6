//! Table storage (Arrow/Parquet)
//!
//! Named tables are Arrow record batches. The on-disk backend keeps one
//! Parquet file per table; the in-memory backend is used by tests and
//! short-lived tools.
//!
//! Write pattern is append-only with a schema check, or a full replace.
//! There are no row-level updates.

mod memory;
mod parquet_store;

pub use memory::MemoryDataStore;
pub use parquet_store::ParquetDataStore;

use crate::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::path::Path;

/// How a pushed batch combines with an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Append rows; the batch schema must match the table schema.
    #[default]
    Append,
    /// Replace the table contents.
    Replace,
}

/// Tabular data store capability interface.
pub trait DataStore: Send + Sync {
    /// Read an entire table as a single batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableNotFound`] if the table does not exist.
    fn pull_table(&self, table: &str) -> Result<RecordBatch>;

    /// Write `batch` to `table`, creating the table if missing.
    ///
    /// # Errors
    ///
    /// Returns error on schema mismatch in [`WriteMode::Append`].
    fn push_table(&self, table: &str, batch: RecordBatch, mode: WriteMode) -> Result<()>;

    /// Whether `table` exists.
    fn has_table(&self, table: &str) -> Result<bool>;
}

/// Batches of one table, with the schema they share.
#[derive(Debug, Clone)]
pub struct StorageEngine {
    schema: Option<SchemaRef>,
    batches: Vec<RecordBatch>,
}

impl StorageEngine {
    /// Create a new storage engine from existing batches
    ///
    /// Useful for testing and benchmarking
    #[must_use]
    pub fn new(batches: Vec<RecordBatch>) -> Self {
        let schema = batches.first().map(RecordBatch::schema);
        Self { schema, batches }
    }

    /// Load table from Parquet file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<Self> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path.as_ref()).map_err(|e| {
            Error::StorageError(format!("Failed to open Parquet file: {e}"))
        })?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| {
            Error::StorageError(format!("Failed to parse Parquet file: {e}"))
        })?;
        let schema = builder.schema().clone();

        let reader = builder.build().map_err(|e| {
            Error::StorageError(format!("Failed to create Parquet reader: {e}"))
        })?;

        let mut batches = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|e| {
                Error::StorageError(format!("Failed to read record batch: {e}"))
            })?;
            batches.push(batch);
        }

        Ok(Self {
            schema: Some(schema),
            batches,
        })
    }

    /// Write every batch to a Parquet file, replacing it.
    ///
    /// # Errors
    /// Returns error if the engine holds no schema or the file cannot be written
    pub fn write_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use parquet::arrow::ArrowWriter;

        let schema = self.schema.clone().ok_or_else(|| {
            Error::StorageError("Cannot write a table without a schema".to_string())
        })?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("parquet.tmp");
        let file = File::create(&tmp)?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        for batch in &self.batches {
            writer.write(batch)?;
        }
        writer.close()?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Get all record batches
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Shared schema, if known.
    #[must_use]
    pub fn schema(&self) -> Option<SchemaRef> {
        self.schema.clone()
    }

    /// Total row count across batches.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Append batches to storage
    ///
    /// # Example
    ///
    /// ```rust
    /// # use churn_guard::storage::StorageEngine;
    /// # use arrow::array::{Int32Array, RecordBatch};
    /// # use arrow::datatypes::{DataType, Field, Schema};
    /// # use std::sync::Arc;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let schema = Arc::new(Schema::new(vec![
    ///     Field::new("id", DataType::Int32, false),
    /// ]));
    /// let batch = RecordBatch::try_new(
    ///     schema,
    ///     vec![Arc::new(Int32Array::from(vec![1, 2, 3]))],
    /// )?;
    ///
    /// let mut storage = StorageEngine::new(vec![]);
    /// storage.append_batch(batch)?;
    /// assert_eq!(storage.num_rows(), 3);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns error if batch schema doesn't match existing batches
    pub fn append_batch(&mut self, batch: RecordBatch) -> Result<()> {
        match &self.schema {
            Some(existing_schema) if batch.schema() != *existing_schema => {
                return Err(Error::StorageError(format!(
                    "Schema mismatch: expected {:?}, got {:?}",
                    existing_schema,
                    batch.schema()
                )));
            }
            Some(_) => {}
            None => self.schema = Some(batch.schema()),
        }

        self.batches.push(batch);
        Ok(())
    }

    /// Concatenate all batches into one.
    ///
    /// # Errors
    /// Returns error if the engine holds no schema
    pub fn concat(&self) -> Result<RecordBatch> {
        let schema = self.schema.clone().ok_or_else(|| {
            Error::StorageError("Cannot read a table without a schema".to_string())
        })?;
        Ok(arrow::compute::concat_batches(&schema, &self.batches)?)
    }
}
