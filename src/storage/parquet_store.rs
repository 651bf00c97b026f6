//! Parquet-per-table data store

use std::path::{Path, PathBuf};

use super::{DataStore, StorageEngine, WriteMode};
use crate::{Error, Result};
use arrow::record_batch::RecordBatch;

/// Data store keeping each table in `<dir>/<table>.parquet`.
///
/// Appends rewrite the file with the new batch added, after the schema
/// check of [`StorageEngine::append_batch`].
#[derive(Debug, Clone)]
pub struct ParquetDataStore {
    dir: PathBuf,
}

impl ParquetDataStore {
    /// Open a store in `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// Directory holding the table files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `table`.
    ///
    /// # Errors
    ///
    /// Returns error for names that would escape the store directory.
    pub fn table_path(&self, table: &str) -> Result<PathBuf> {
        if table.is_empty() || table.contains(['/', '\\']) || table.starts_with('.') {
            return Err(Error::InvalidInput(format!("Invalid table name: {table:?}")));
        }
        Ok(self.dir.join(format!("{table}.parquet")))
    }
}

impl DataStore for ParquetDataStore {
    fn pull_table(&self, table: &str) -> Result<RecordBatch> {
        let path = self.table_path(table)?;
        if !path.is_file() {
            return Err(Error::TableNotFound(table.to_string()));
        }
        StorageEngine::load_parquet(&path)?.concat()
    }

    fn push_table(&self, table: &str, batch: RecordBatch, mode: WriteMode) -> Result<()> {
        let path = self.table_path(table)?;
        let rows = batch.num_rows();

        let engine = match mode {
            WriteMode::Append if path.is_file() => {
                let mut engine = StorageEngine::load_parquet(&path)?;
                engine.append_batch(batch)?;
                engine
            }
            WriteMode::Append | WriteMode::Replace => StorageEngine::new(vec![batch]),
        };
        engine.write_parquet(&path)?;

        tracing::debug!(table, rows, ?mode, "Wrote table");
        Ok(())
    }

    fn has_table(&self, table: &str) -> Result<bool> {
        Ok(self.table_path(table)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::create_test_batch;

    #[test]
    fn test_parquet_store_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetDataStore::open(dir.path().join("customer")).unwrap();

        store
            .push_table("predictions", create_test_batch(4), WriteMode::Append)
            .unwrap();
        store
            .push_table("predictions", create_test_batch(6), WriteMode::Append)
            .unwrap();

        assert!(store.has_table("predictions").unwrap());
        assert_eq!(store.pull_table("predictions").unwrap().num_rows(), 10);
    }

    #[test]
    fn test_parquet_store_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetDataStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.pull_table("processdata"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_parquet_store_rejects_path_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetDataStore::open(dir.path()).unwrap();
        assert!(store.table_path("../etc").is_err());
        assert!(store.table_path("").is_err());
        assert!(store.table_path("processdata").is_ok());
    }
}
