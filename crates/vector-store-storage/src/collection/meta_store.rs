//! Metadata namespace: the persisted `CollectionConfig`.

use rocksdb::WriteBatch;
use tracing::{debug, warn};
use vector_store_core::CollectionConfig;

use super::CollectionDb;
use crate::column_families::CF_META;
use crate::error::{StoreError, StoreResult};
use crate::schema::MetaKey;
use crate::serialization::{decode_meta_str, decode_meta_u64, encode_meta_u64};

impl CollectionDb {
    fn get_meta(&self, key: MetaKey) -> StoreResult<Option<Vec<u8>>> {
        let cf = self.get_cf(CF_META)?;
        self.db
            .get_cf(cf, key.as_bytes())
            .map_err(|e| StoreError::rocksdb_op(&self.name, "get", CF_META, Some(key.as_str()), e))
    }

    fn get_meta_usize(&self, key: MetaKey) -> StoreResult<Option<usize>> {
        let Some(bytes) = self.get_meta(key)? else {
            return Ok(None);
        };
        let value = decode_meta_u64(&bytes)
            .map_err(|reason| StoreError::corrupt(&self.name, key.as_str(), reason))?;
        usize::try_from(value).map(Some).map_err(|_| {
            StoreError::corrupt(
                &self.name,
                key.as_str(),
                format!("value {} does not fit in usize", value),
            )
        })
    }

    /// Read the stored configuration.
    ///
    /// Returns `Ok(None)` when no metadata has been written yet.
    ///
    /// # Errors
    /// `StoreError::IndexCorrupt` if only some keys are present or a value
    /// cannot be decoded.
    pub fn read_collection_config(&self) -> StoreResult<Option<CollectionConfig>> {
        let collection_name = match self.get_meta(MetaKey::CollectionName)? {
            Some(bytes) => Some(decode_meta_str(&bytes).map_err(|reason| {
                StoreError::corrupt(&self.name, MetaKey::CollectionName.as_str(), reason)
            })?),
            None => None,
        };
        let m = self.get_meta_usize(MetaKey::Neighbors)?;
        let ef_construction = self.get_meta_usize(MetaKey::EfConstruction)?;

        match (collection_name, m, ef_construction) {
            (None, None, None) => Ok(None),
            (Some(collection_name), Some(m), Some(ef_construction)) => Ok(Some(CollectionConfig {
                collection_name,
                m,
                ef_construction,
            })),
            (name, m, ef) => {
                let missing = [
                    (MetaKey::CollectionName, name.is_none()),
                    (MetaKey::Neighbors, m.is_none()),
                    (MetaKey::EfConstruction, ef.is_none()),
                ]
                .into_iter()
                .find(|(_, absent)| *absent)
                .map(|(key, _)| key)
                .unwrap_or(MetaKey::CollectionName);
                Err(StoreError::corrupt(
                    &self.name,
                    missing.as_str(),
                    "metadata is incomplete",
                ))
            }
        }
    }

    /// Write all three metadata keys in one batch.
    pub fn write_collection_config(&self, config: &CollectionConfig) -> StoreResult<()> {
        let cf = self.get_cf(CF_META)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            cf,
            MetaKey::EfConstruction.as_bytes(),
            encode_meta_u64(config.ef_construction as u64),
        );
        batch.put_cf(
            cf,
            MetaKey::Neighbors.as_bytes(),
            encode_meta_u64(config.m as u64),
        );
        batch.put_cf(
            cf,
            MetaKey::CollectionName.as_bytes(),
            config.collection_name.as_bytes(),
        );
        self.db
            .write(batch)
            .map_err(|e| StoreError::rocksdb_op(&self.name, "write_batch", CF_META, None, e))?;

        debug!(
            "Wrote metadata for '{}': M={} efConstruction={}",
            self.name, config.m, config.ef_construction
        );
        Ok(())
    }

    /// Write the metadata if absent, otherwise verify it matches `requested`.
    ///
    /// Returns `true` if the metadata was written by this call. On mismatch
    /// nothing is rewritten.
    pub fn populate_meta(&self, requested: &CollectionConfig) -> StoreResult<bool> {
        match self.read_collection_config()? {
            None => {
                self.write_collection_config(requested)?;
                Ok(true)
            }
            Some(stored) => {
                check_config(&self.name, &stored, requested)?;
                debug!("Metadata for '{}' already present and consistent", self.name);
                Ok(false)
            }
        }
    }
}

/// Compare stored and requested configuration.
///
/// Keys are checked in `MetaKey::ALL` order and the first disagreement is
/// reported.
///
/// # Errors
/// `StoreError::ConfigMismatch` naming the key and both values.
pub fn check_config(
    collection: &str,
    stored: &CollectionConfig,
    requested: &CollectionConfig,
) -> StoreResult<()> {
    for key in MetaKey::ALL {
        let (stored_value, requested_value) = match key {
            MetaKey::CollectionName => (
                stored.collection_name.clone(),
                requested.collection_name.clone(),
            ),
            MetaKey::Neighbors => (stored.m.to_string(), requested.m.to_string()),
            MetaKey::EfConstruction => (
                stored.ef_construction.to_string(),
                requested.ef_construction.to_string(),
            ),
        };
        if stored_value != requested_value {
            warn!(
                "Configuration mismatch for '{}': stored {}={}, requested {}",
                collection, key, stored_value, requested_value
            );
            return Err(StoreError::ConfigMismatch {
                collection: collection.to_string(),
                key: key.as_str(),
                stored: stored_value,
                requested: requested_value,
            });
        }
    }
    Ok(())
}
