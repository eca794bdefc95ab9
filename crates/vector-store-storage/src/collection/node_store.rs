//! Node namespace: one bincode record per graph node.

use rocksdb::{IteratorMode, WriteBatch};
use tracing::debug;

use super::CollectionDb;
use crate::column_families::CF_INDEX;
use crate::error::{StoreError, StoreResult};

/// A raw `(key, value)` pair from the index CF.
pub type RawRecord = (Box<[u8]>, Box<[u8]>);

impl CollectionDb {
    /// Write one encoded record.
    pub fn put_record(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let cf = self.get_cf(CF_INDEX)?;
        self.db
            .put_cf(cf, key.as_bytes(), value)
            .map_err(|e| StoreError::rocksdb_op(&self.name, "put", CF_INDEX, Some(key), e))
    }

    /// Write every record and remove every `stale` key in one atomic batch.
    pub fn write_records_atomic(
        &self,
        records: &[(String, Vec<u8>)],
        stale: &[Box<[u8]>],
    ) -> StoreResult<()> {
        let cf = self.get_cf(CF_INDEX)?;
        let mut batch = WriteBatch::default();
        for (key, value) in records {
            batch.put_cf(cf, key.as_bytes(), value);
        }
        for key in stale {
            batch.delete_cf(cf, key);
        }
        self.db
            .write(batch)
            .map_err(|e| StoreError::rocksdb_op(&self.name, "write_batch", CF_INDEX, None, e))?;

        debug!(
            "Batch wrote {} records and removed {} stale keys in '{}'",
            records.len(),
            stale.len(),
            self.name
        );
        Ok(())
    }

    /// Remove `keys` in one batch.
    pub fn delete_records(&self, keys: &[Box<[u8]>]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let cf = self.get_cf(CF_INDEX)?;
        let mut batch = WriteBatch::default();
        for key in keys {
            batch.delete_cf(cf, key);
        }
        self.db
            .write(batch)
            .map_err(|e| StoreError::rocksdb_op(&self.name, "delete", CF_INDEX, None, e))
    }

    /// Every key in the index CF.
    pub fn stored_keys(&self) -> StoreResult<Vec<Box<[u8]>>> {
        let cf = self.get_cf(CF_INDEX)?;
        let iter = self.db.iterator_cf(cf, IteratorMode::Start);

        let mut keys = Vec::new();
        for result in iter {
            let (key, _) = result
                .map_err(|e| StoreError::rocksdb_op(&self.name, "iterate", CF_INDEX, None, e))?;
            keys.push(key);
        }
        Ok(keys)
    }

    /// Number of records in the index CF.
    pub fn record_count(&self) -> StoreResult<usize> {
        self.stored_keys().map(|keys| keys.len())
    }

    /// Every `(key, value)` pair in the index CF.
    pub fn read_all_records(&self) -> StoreResult<Vec<RawRecord>> {
        let cf = self.get_cf(CF_INDEX)?;
        self.db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| {
                item.map_err(|e| StoreError::rocksdb_op(&self.name, "iterate", CF_INDEX, None, e))
            })
            .collect()
    }

    /// Remove every record. Returns how many were removed.
    pub fn clear_records(&self) -> StoreResult<usize> {
        let keys = self.stored_keys()?;
        self.delete_records(&keys)?;
        debug!("Cleared {} records from '{}'", keys.len(), self.name);
        Ok(keys.len())
    }
}
