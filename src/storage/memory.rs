//! In-memory data store using `DashMap`.
//!
//! Data is lost on process restart.

use super::{DataStore, StorageEngine, WriteMode};
use crate::{Error, Result};
use arrow::record_batch::RecordBatch;
use dashmap::DashMap;

/// In-memory table store.
///
/// # Example
///
/// ```rust
/// use churn_guard::storage::{DataStore, MemoryDataStore, WriteMode};
/// # use arrow::array::{Int32Array, RecordBatch};
/// # use arrow::datatypes::{DataType, Field, Schema};
/// # use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]));
/// # let batch = RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1, 2]))])?;
/// let store = MemoryDataStore::new();
/// store.push_table("processdata", batch, WriteMode::Replace)?;
/// assert_eq!(store.pull_table("processdata")?.num_rows(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    tables: DashMap<String, StorageEngine>,
}

impl MemoryDataStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the store holds no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl DataStore for MemoryDataStore {
    fn pull_table(&self, table: &str) -> Result<RecordBatch> {
        self.tables
            .get(table)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?
            .concat()
    }

    fn push_table(&self, table: &str, batch: RecordBatch, mode: WriteMode) -> Result<()> {
        match mode {
            WriteMode::Replace => {
                self.tables
                    .insert(table.to_string(), StorageEngine::new(vec![batch]));
            }
            WriteMode::Append => {
                self.tables
                    .entry(table.to_string())
                    .or_insert_with(|| StorageEngine::new(vec![]))
                    .append_batch(batch)?;
            }
        }
        Ok(())
    }

    fn has_table(&self, table: &str) -> Result<bool> {
        Ok(self.tables.contains_key(table))
    }
}
