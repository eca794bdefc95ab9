//! Durable operations of the coordinator.
//!
//! Every RocksDB call runs on a blocking thread via `spawn_blocking`, and that
//! thread owns the op lock guard until its work is done. The engine lock is
//! taken only to copy the table out (save) or swap a fully validated table in
//! (load), never across an `.await`.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};
use vector_store_core::{GraphEngine, NodeTable};

use super::{Lifecycle, OpGuard, VectorStore};
use crate::collection::{check_config, destroy_path, CollectionDb};
use crate::config::SaveMode;
use crate::error::{StoreError, StoreResult};
use crate::schema::node_key;
use crate::serialization::{serialize_record, NodeRecord};

use super::validation::validate_records;

/// Encoded records ready to write, keyed by node key.
type EncodedRecords = Vec<(String, Vec<u8>)>;

impl<G: GraphEngine + 'static> VectorStore<G> {
    // ==================== Initialization ====================

    /// Open or create both namespaces.
    ///
    /// Idempotent once `Ready`. On failure the coordinator returns to
    /// `Uninitialized` and `init` may be retried.
    ///
    /// # Errors
    /// - `StoreError::StoreInitError` if RocksDB cannot open the directory
    /// - `StoreError::Deleted` after a successful `delete_index`
    pub async fn init(&self) -> StoreResult<()> {
        let guard = self.lock_ops().await;
        let name = self.config.collection_name.clone();

        {
            let mut lifecycle = self.lifecycle.write();
            match &*lifecycle {
                Lifecycle::Ready(_) => {
                    debug!("init on '{}' skipped: already ready", name);
                    return Ok(());
                }
                Lifecycle::Deleted => return Err(self.deleted_error("init")),
                Lifecycle::Uninitialized | Lifecycle::Initializing => {}
            }
            *lifecycle = Lifecycle::Initializing;
        }

        let store_config = self.store_config.clone();
        let task_name = name.clone();
        let opened = self
            .run_locked(guard, "init", move || {
                CollectionDb::open(&task_name, &store_config)
            })
            .await;

        let mut lifecycle = self.lifecycle.write();
        match opened {
            Ok((db, _guard)) => {
                *lifecycle = Lifecycle::Ready(Arc::new(db));
                debug!("Vector store '{}' initialized", name);
                Ok(())
            }
            Err(e) => {
                *lifecycle = Lifecycle::Uninitialized;
                error!("Failed to initialize vector store '{}': {}", name, e);
                Err(e)
            }
        }
    }

    /// Write the collection metadata if absent.
    ///
    /// # Errors
    /// `StoreError::ConfigMismatch` if stored metadata disagrees with this
    /// coordinator's configuration. Nothing is rewritten in that case.
    pub async fn populate_meta(&self) -> StoreResult<()> {
        let guard = self.lock_ops().await;
        let db = self.ready_db("populate_meta")?;
        let config = self.config.clone();

        let (written, _guard) = self
            .run_locked(guard, "populate_meta", move || db.populate_meta(&config))
            .await?;

        if written {
            info!(
                "Populated metadata for '{}': M={} efConstruction={}",
                self.config.collection_name, self.config.m, self.config.ef_construction
            );
        }
        Ok(())
    }

    // ==================== Index Operations ====================

    pub(crate) async fn create_index_async(&self, overwrite: bool) -> StoreResult<usize> {
        let guard = self.lock_ops().await;
        let db = self.ready_db("create_index")?;
        let config = self.config.clone();

        let (cleared, _guard) = self
            .run_locked(guard, "create_index", move || {
                let existing = db.record_count()?;
                if existing > 0 && !overwrite {
                    return Err(StoreError::AlreadyExists {
                        collection: config.collection_name.clone(),
                        records: existing,
                    });
                }
                if let Some(stored) = db.read_collection_config()? {
                    check_config(&config.collection_name, &stored, &config)?;
                }
                db.write_collection_config(&config)?;
                db.clear_records()
            })
            .await?;

        info!(
            "Created empty index for '{}' ({} records cleared)",
            self.config.collection_name, cleared
        );
        Ok(cleared)
    }

    pub(crate) async fn load_index_async(&self) -> StoreResult<usize> {
        let guard = self.lock_ops().await;
        let db = self.ready_db("load_index")?;
        let config = self.config.clone();

        let (table, _guard): (NodeTable, OpGuard) = self
            .run_locked(guard, "load_index", move || {
                let raw = db.read_all_records()?;
                if raw.is_empty() {
                    return Err(StoreError::IndexMissing {
                        collection: config.collection_name.clone(),
                    });
                }
                match db.read_collection_config()? {
                    Some(stored) => check_config(&config.collection_name, &stored, &config)?,
                    None => {
                        return Err(StoreError::corrupt(
                            &config.collection_name,
                            "collectionName",
                            "node records present without metadata",
                        ))
                    }
                }
                validate_records(&config.collection_name, raw)
            })
            .await
            .map_err(|e| {
                match &e {
                    StoreError::IndexMissing { .. } => {
                        debug!("No stored index for '{}'", self.config.collection_name)
                    }
                    _ => warn!("Load of '{}' rejected: {}", self.config.collection_name, e),
                }
                e
            })?;

        let count = table.len();
        self.engine.write().replace_nodes(table);

        info!(
            "Loaded {} nodes into '{}'",
            count, self.config.collection_name
        );
        Ok(count)
    }

    pub(crate) async fn save_index_async(&self) -> StoreResult<usize> {
        let guard = self.lock_ops().await;
        let db = self.ready_db("save_index")?;
        let name = self.config.collection_name.clone();

        // Owned copies, so the engine is free again before any I/O.
        let records: Vec<NodeRecord> = {
            let engine = self.engine.read();
            engine
                .nodes()
                .values()
                .map(|node| NodeRecord::from_node(&name, node))
                .collect::<StoreResult<_>>()?
        };
        let count = records.len();

        let encoded: EncodedRecords = records
            .iter()
            .map(|record| Ok((node_key(record.id), serialize_record(&name, record)?)))
            .collect::<StoreResult<_>>()?;

        let _guard = match self.store_config.save_mode {
            SaveMode::Atomic => {
                let task_name = name.clone();
                let ((), guard) = self
                    .run_locked(guard, "save_index", move || {
                        let stale = stale_keys(&db, &encoded)?;
                        db.write_records_atomic(&encoded, &stale)?;
                        debug!("Removed {} stale records from '{}'", stale.len(), task_name);
                        Ok(())
                    })
                    .await?;
                guard
            }
            SaveMode::PerRecord => {
                let workers = self.store_config.write_concurrency.max(1);
                let (result, guard) =
                    tokio::spawn(save_per_record(name.clone(), db, encoded, workers, guard))
                        .await
                        .map_err(|e| StoreError::task(&name, "save_index", e))?;
                result?;
                guard
            }
        };

        info!(
            "Saved {} nodes for '{}' ({:?} mode)",
            count, name, self.store_config.save_mode
        );
        Ok(count)
    }

    pub(crate) async fn delete_index_async(&self) -> StoreResult<()> {
        let guard = self.lock_ops().await;
        let name = self.config.collection_name.clone();

        let db = {
            let mut lifecycle = self.lifecycle.write();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Uninitialized) {
                Lifecycle::Ready(db) => match Arc::try_unwrap(db) {
                    Ok(db) => db,
                    Err(db) => {
                        let path = db.path().display().to_string();
                        *lifecycle = Lifecycle::Ready(db);
                        return Err(StoreError::PurgeFailed {
                            collection: name,
                            path,
                            message: "database handle still in use".to_string(),
                        });
                    }
                },
                Lifecycle::Deleted => {
                    *lifecycle = Lifecycle::Deleted;
                    return Err(self.deleted_error("delete_index"));
                }
                other => {
                    *lifecycle = other;
                    return Err(self.uninitialized_error("delete_index"));
                }
            }
        };

        let path = db.path().to_path_buf();
        let task_name = name.clone();
        let task_path = path.clone();
        let purged = tokio::task::spawn_blocking(move || {
            // The directory lock is released when the handle drops.
            drop(db);
            (destroy_path(&task_name, &task_path), guard)
        })
        .await
        .map_err(|e| StoreError::PurgeFailed {
            collection: name.clone(),
            path: path.display().to_string(),
            message: e.to_string(),
        })
        .and_then(|(result, guard)| result.map(|()| guard));

        let _guard = match purged {
            Ok(guard) => guard,
            Err(e) => {
                error!("Failed to delete vector store '{}': {}", name, e);
                return Err(e);
            }
        };

        self.engine.write().replace_nodes(NodeTable::new());
        *self.lifecycle.write() = Lifecycle::Deleted;

        info!("Deleted vector store '{}' at {:?}", name, path);
        Ok(())
    }

    // ==================== Diagnostics ====================

    /// Number of node records currently stored.
    pub async fn stored_record_count(&self) -> StoreResult<usize> {
        let guard = self.lock_ops().await;
        let db = self.ready_db("stored_record_count")?;
        self.run_locked(guard, "stored_record_count", move || db.record_count())
            .await
            .map(|(count, _)| count)
    }

    /// Raw stored bytes for `key` in column family `cf_name`.
    pub async fn get_raw_bytes(&self, cf_name: &'static str, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let guard = self.lock_ops().await;
        let db = self.ready_db("get_raw_bytes")?;
        let key = key.to_vec();
        self.run_locked(guard, "get_raw_bytes", move || db.get_raw_bytes(cf_name, &key))
            .await
            .map(|(bytes, _)| bytes)
    }

    /// Overwrite raw stored bytes, bypassing every encoding and check.
    pub async fn put_raw_bytes(&self, cf_name: &'static str, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let guard = self.lock_ops().await;
        let db = self.ready_db("put_raw_bytes")?;
        let (key, value) = (key.to_vec(), value.to_vec());
        self.run_locked(guard, "put_raw_bytes", move || {
            db.put_raw_bytes(cf_name, &key, &value)
        })
        .await
        .map(|((), _)| ())
    }

    /// Verify both column families are accessible.
    pub async fn health_check(&self) -> StoreResult<()> {
        let guard = self.lock_ops().await;
        let db = self.ready_db("health_check")?;
        self.run_locked(guard, "health_check", move || db.health_check())
            .await
            .map(|((), _)| ())
    }

    /// Flush both column families to disk.
    pub async fn flush(&self) -> StoreResult<()> {
        let guard = self.lock_ops().await;
        let db = self.ready_db("flush")?;
        self.run_locked(guard, "flush", move || db.flush())
            .await
            .map(|((), _)| ())
    }

    /// Run `work` on a blocking thread that owns `guard`.
    ///
    /// The guard comes back behind the result, so it is dropped after
    /// anything `work` returned, and the lock stays held until the work has
    /// finished even when the calling future is dropped first.
    async fn run_locked<T, F>(
        &self,
        guard: OpGuard,
        operation: &'static str,
        work: F,
    ) -> StoreResult<(T, OpGuard)>
    where
        T: Send + 'static,
        F: FnOnce() -> StoreResult<T> + Send + 'static,
    {
        let (result, guard) = tokio::task::spawn_blocking(move || (work(), guard))
            .await
            .map_err(|e| StoreError::task(&self.config.collection_name, operation, e))?;
        result.map(|value| (value, guard))
    }
}

/// Per-record save body, run as its own task so it owns the op lock guard.
async fn save_per_record(
    name: String,
    db: Arc<CollectionDb>,
    encoded: EncodedRecords,
    workers: usize,
    guard: OpGuard,
) -> (StoreResult<()>, OpGuard) {
    let result = write_per_record(&name, db, encoded, workers).await;
    (result, guard)
}

/// Dispatch one put per record across `workers` blocking tasks, wait for all
/// of them, then drop stale records.
///
/// Every task runs to completion even if another fails; the first error is
/// returned once all writes have settled.
async fn write_per_record(
    name: &str,
    db: Arc<CollectionDb>,
    encoded: EncodedRecords,
    workers: usize,
) -> StoreResult<()> {
    let live: HashSet<String> = encoded.iter().map(|(key, _)| key.clone()).collect();
    let chunk_size = encoded.len().div_ceil(workers).max(1);

    let mut chunks: Vec<EncodedRecords> = Vec::with_capacity(workers);
    let mut remaining = encoded.into_iter();
    loop {
        let chunk: EncodedRecords = remaining.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }

    let tasks = chunks.into_iter().map(|chunk| {
        let db = Arc::clone(&db);
        tokio::task::spawn_blocking(move || {
            let mut first_error = None;
            for (key, value) in &chunk {
                if let Err(e) = db.put_record(key, value) {
                    first_error.get_or_insert(e);
                }
            }
            first_error.map_or(Ok(()), Err)
        })
    });

    let outcomes = join_all(tasks).await;
    let mut failures = 0usize;
    let mut first_error: Option<StoreError> = None;
    for outcome in outcomes {
        let result = outcome
            .map_err(|e| StoreError::task(name, "save_index", e))
            .and_then(|r| r);
        if let Err(e) = result {
            failures += 1;
            first_error.get_or_insert(e);
        }
    }
    if let Some(e) = first_error {
        error!(
            "Save of '{}' incomplete: {} write tasks failed; index must be re-saved",
            name, failures
        );
        return Err(e);
    }

    let stale_count = tokio::task::spawn_blocking(move || {
        let stale: Vec<Box<[u8]>> = db
            .stored_keys()?
            .into_iter()
            .filter(|key| std::str::from_utf8(key).map_or(true, |k| !live.contains(k)))
            .collect();
        db.delete_records(&stale)?;
        Ok::<_, StoreError>(stale.len())
    })
    .await
    .map_err(|e| StoreError::task(name, "save_index", e))??;

    debug!("Removed {} stale records from '{}'", stale_count, name);
    Ok(())
}

/// Stored keys that do not belong to any record in `encoded`.
fn stale_keys(db: &CollectionDb, encoded: &EncodedRecords) -> StoreResult<Vec<Box<[u8]>>> {
    let live: HashSet<&[u8]> = encoded.iter().map(|(key, _)| key.as_bytes()).collect();
    Ok(db
        .stored_keys()?
        .into_iter()
        .filter(|key| !live.contains(&key[..]))
        .collect())
}
