//! RocksDB handle for a single vector collection.
//!
//! A collection is one RocksDB directory at `<data_dir>/<collection_name>`
//! holding the `meta` and `index` column families. `CollectionDb` owns the
//! open database; every method is synchronous and meant to run on a blocking
//! thread.
//!
//! # Module Structure
//!
//! - `meta_store` - typed reads and writes of the collection configuration
//! - `node_store` - node record puts, batch writes, scans, and removal

mod meta_store;
mod node_store;


use std::path::{Path, PathBuf};

use rocksdb::{Cache, ColumnFamily, Options, DB};
use tracing::{debug, info};

use crate::column_families::{get_vector_store_cf_descriptors, VECTOR_STORE_CFS};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

pub use meta_store::check_config;
pub use node_store::RawRecord;

/// An open collection database.
///
/// # Thread Safety
/// RocksDB's `DB` is internally synchronized, so a `CollectionDb` can be
/// shared across blocking tasks via `Arc<CollectionDb>`.
pub struct CollectionDb {
    db: DB,
    /// Shared block cache (kept alive for DB lifetime).
    #[allow(dead_code)]
    cache: Cache,
    name: String,
    path: PathBuf,
}

impl std::fmt::Debug for CollectionDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionDb")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl CollectionDb {
    /// Open or create the collection's database and both column families.
    ///
    /// # Errors
    /// `StoreError::StoreInitError` if the directory cannot be created or
    /// RocksDB refuses to open it, including when another handle already
    /// holds the directory lock.
    pub fn open(name: &str, config: &StoreConfig) -> StoreResult<Self> {
        let path = config.collection_path(name);
        let init_error = |message: String| StoreError::StoreInitError {
            collection: name.to_string(),
            path: path.display().to_string(),
            message,
        };

        if config.create_if_missing {
            std::fs::create_dir_all(&config.data_dir).map_err(|e| {
                init_error(format!(
                    "cannot create data_dir '{}': {}",
                    config.data_dir.display(),
                    e
                ))
            })?;
        }

        let cache = Cache::new_lru_cache(config.block_cache_size);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(config.create_if_missing);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_open_files(config.max_open_files);

        if !config.enable_wal {
            db_opts.set_manual_wal_flush(true);
        }

        let cf_descriptors = get_vector_store_cf_descriptors(&cache);

        let db = DB::open_cf_descriptors(&db_opts, &path, cf_descriptors)
            .map_err(|e| init_error(e.to_string()))?;

        info!("Opened vector collection '{}' at {:?}", name, path);

        Ok(Self {
            db,
            cache,
            name: name.to_string(),
            path,
        })
    }

    /// Get a reference to a column family by name.
    ///
    /// # Errors
    /// `StoreError::ColumnFamilyNotFound` if the CF doesn't exist.
    pub fn get_cf(&self, name: &str) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound {
                name: name.to_string(),
            })
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify both column families are accessible.
    pub fn health_check(&self) -> StoreResult<()> {
        for &cf_name in VECTOR_STORE_CFS {
            self.get_cf(cf_name)?;
        }
        Ok(())
    }

    /// Flush both column families to disk.
    pub fn flush(&self) -> StoreResult<()> {
        for &cf_name in VECTOR_STORE_CFS {
            let cf = self.get_cf(cf_name)?;
            self.db
                .flush_cf(cf)
                .map_err(|e| StoreError::rocksdb_op(&self.name, "flush", cf_name, None, e))?;
        }
        Ok(())
    }

    /// Read raw bytes from any column family.
    ///
    /// Bypasses every encoding; intended for diagnostics and tests.
    pub fn get_raw_bytes(&self, cf_name: &'static str, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let cf = self.get_cf(cf_name)?;
        self.db.get_cf(cf, key).map_err(|e| {
            StoreError::rocksdb_op(
                &self.name,
                "get",
                cf_name,
                Some(&*String::from_utf8_lossy(key)),
                e,
            )
        })
    }

    /// Write raw bytes to any column family.
    ///
    /// Bypasses every encoding and invariant check; intended for diagnostics
    /// and tests.
    pub fn put_raw_bytes(&self, cf_name: &'static str, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let cf = self.get_cf(cf_name)?;
        self.db.put_cf(cf, key, value).map_err(|e| {
            StoreError::rocksdb_op(
                &self.name,
                "put",
                cf_name,
                Some(&*String::from_utf8_lossy(key)),
                e,
            )
        })
    }

    /// Delete a raw key from any column family.
    pub fn delete_raw_bytes(&self, cf_name: &'static str, key: &[u8]) -> StoreResult<()> {
        let cf = self.get_cf(cf_name)?;
        self.db.delete_cf(cf, key).map_err(|e| {
            StoreError::rocksdb_op(
                &self.name,
                "delete",
                cf_name,
                Some(&*String::from_utf8_lossy(key)),
                e,
            )
        })
    }
}

/// Remove a collection's directory and everything in it.
///
/// The database must not be open. A missing directory counts as success.
///
/// # Errors
/// `StoreError::PurgeFailed` if RocksDB or the filesystem refuses.
pub fn destroy_collection(name: &str, config: &StoreConfig) -> StoreResult<()> {
    destroy_path(name, &config.collection_path(name))
}

pub(crate) fn destroy_path(name: &str, path: &Path) -> StoreResult<()> {
    let purge_error = |message: String| StoreError::PurgeFailed {
        collection: name.to_string(),
        path: path.display().to_string(),
        message,
    };

    if !path.exists() {
        debug!("Collection '{}' has no directory at {:?}", name, path);
        return Ok(());
    }

    DB::destroy(&Options::default(), path).map_err(|e| purge_error(e.to_string()))?;

    // DB::destroy leaves the directory itself (and any foreign files) behind.
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| purge_error(e.to_string()))?;
    }

    info!("Destroyed vector collection '{}' at {:?}", name, path);
    Ok(())
}
