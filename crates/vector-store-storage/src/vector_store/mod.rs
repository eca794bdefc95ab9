//! Persistence coordinator for one vector collection.
//!
//! `VectorStore` pairs an in-memory [`GraphEngine`] with the collection's
//! RocksDB directory and moves the node table between them.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --init()--> Initializing --ok--> Ready --delete_index()--> Deleted
//!        ^                        |
//!        +--------- error --------+
//! ```
//!
//! `Deleted` is terminal. A new collection needs a new `VectorStore::create`.
//!
//! # Thread Safety
//!
//! The engine sits behind a `parking_lot::RwLock`, so queries run in parallel
//! with each other and never wait on disk. `create_index`, `load_index`,
//! `save_index`, and `delete_index` are serialized by an async mutex; the
//! engine lock is only held while the table is copied out or swapped in.
//!
//! Durable writes carry the mutex guard into their background task. Dropping
//! an in-flight `save_index` (for example under `tokio::time::timeout`) does
//! not release the lock until every write it dispatched has settled.
//!
//! # Module Structure
//!
//! - `persistence` - init, populate_meta, create/load/save/delete index
//! - `validation` - checks applied to stored records before a load
//! - `trait_impl` - `IndexPersistence` implementation (thin wrapper)

mod persistence;
mod trait_impl;
mod validation;


use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};
use vector_store_core::{
    CollectionConfig, GraphEngine, HnswGraph, NodeId, NodeTable, VectorResult, DEFAULT_QUERY_K,
};

use crate::collection::CollectionDb;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// Observable lifecycle state of a [`VectorStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No durable namespaces are open.
    Uninitialized,
    /// `init` is opening the namespaces.
    Initializing,
    /// Namespaces open; every operation is available.
    Ready,
    /// `delete_index` succeeded. Every further operation fails.
    Deleted,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Ready => "ready",
            LifecycleState::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Held for the duration of one durable operation.
type OpGuard = OwnedMutexGuard<()>;

/// Lifecycle plus the handle that only exists while `Ready`.
enum Lifecycle {
    Uninitialized,
    Initializing,
    Ready(Arc<CollectionDb>),
    Deleted,
}

impl Lifecycle {
    fn state(&self) -> LifecycleState {
        match self {
            Lifecycle::Uninitialized => LifecycleState::Uninitialized,
            Lifecycle::Initializing => LifecycleState::Initializing,
            Lifecycle::Ready(_) => LifecycleState::Ready,
            Lifecycle::Deleted => LifecycleState::Deleted,
        }
    }
}

/// A persistent vector collection.
///
/// # Example
/// ```rust,ignore
/// use vector_store_core::CollectionConfig;
/// use vector_store_storage::{IndexPersistence, StoreConfig, VectorStore};
///
/// let store: VectorStore = VectorStore::create(
///     CollectionConfig::new("docs"),
///     StoreConfig::with_data_dir("/var/lib/vectors"),
/// )
/// .await?;
/// store.insert(vec![1.0, 0.0, 0.0])?;
/// store.save_index().await?;
/// let nearest = store.query(&[1.0, 0.0, 0.0], 3)?;
/// ```
pub struct VectorStore<G: GraphEngine = HnswGraph> {
    config: CollectionConfig,
    store_config: StoreConfig,
    engine: RwLock<G>,
    lifecycle: RwLock<Lifecycle>,
    op_lock: Arc<Mutex<()>>,
}

impl<G: GraphEngine> std::fmt::Debug for VectorStore<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("nodes", &self.len())
            .finish_non_exhaustive()
    }
}

impl<G: GraphEngine + 'static> VectorStore<G> {
    /// Build an uninitialized coordinator. No I/O happens until `init`.
    ///
    /// # Errors
    /// `StoreError::InvalidConfig` if either configuration is invalid.
    pub fn new(config: CollectionConfig, store_config: StoreConfig) -> StoreResult<Self> {
        config.validate().map_err(|e| StoreError::InvalidConfig {
            message: e.to_string(),
        })?;
        store_config.validate()?;

        let mut engine = G::new(config.m, config.ef_construction);
        engine.set_ef_search(store_config.ef_search);

        debug!(
            "Created coordinator for '{}' (M={}, efConstruction={})",
            config.collection_name, config.m, config.ef_construction
        );

        Ok(Self {
            config,
            store_config,
            engine: RwLock::new(engine),
            lifecycle: RwLock::new(Lifecycle::Uninitialized),
            op_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Open or create the collection and make sure its metadata matches
    /// `config`. Returns a `Ready` coordinator with an empty engine.
    ///
    /// # Errors
    /// - `StoreError::InvalidConfig` if either configuration is invalid
    /// - `StoreError::StoreInitError` if the namespaces cannot be opened
    /// - `StoreError::ConfigMismatch` if stored metadata disagrees with `config`
    pub async fn create(config: CollectionConfig, store_config: StoreConfig) -> StoreResult<Self> {
        let store = Self::new(config, store_config)?;
        store.init().await?;
        store.populate_meta().await?;
        info!(
            "Vector store '{}' ready at {:?}",
            store.config.collection_name,
            store.store_config.collection_path(&store.config.collection_name)
        );
        Ok(store)
    }

    /// Open an existing collection using its stored metadata as the
    /// configuration. The engine starts empty; call `load_index` to
    /// rehydrate it.
    ///
    /// # Errors
    /// - `StoreError::IndexMissing` if the collection directory or its
    ///   metadata does not exist
    /// - `StoreError::IndexCorrupt` if the metadata is incomplete
    /// - `StoreError::StoreInitError` if the namespaces cannot be opened
    pub async fn open_existing(collection_name: &str, store_config: StoreConfig) -> StoreResult<Self> {
        CollectionConfig::new(collection_name)
            .validate()
            .map_err(|e| StoreError::InvalidConfig {
                message: e.to_string(),
            })?;
        store_config.validate()?;

        let path = store_config.collection_path(collection_name);
        if !path.exists() {
            return Err(StoreError::IndexMissing {
                collection: collection_name.to_string(),
            });
        }

        let open_config = StoreConfig {
            create_if_missing: false,
            ..store_config.clone()
        };
        let name = collection_name.to_string();
        let (db, stored) = tokio::task::spawn_blocking(move || {
            let db = CollectionDb::open(&name, &open_config)?;
            let stored = db.read_collection_config()?;
            Ok::<_, StoreError>((db, stored))
        })
        .await
        .map_err(|e| StoreError::task(collection_name, "open_existing", e))??;

        let Some(config) = stored else {
            return Err(StoreError::IndexMissing {
                collection: collection_name.to_string(),
            });
        };
        if config.collection_name != collection_name {
            return Err(StoreError::ConfigMismatch {
                collection: collection_name.to_string(),
                key: "collectionName",
                stored: config.collection_name,
                requested: collection_name.to_string(),
            });
        }

        let store = Self::new(config, store_config)?;
        *store.lifecycle.write() = Lifecycle::Ready(Arc::new(db));
        info!(
            "Opened existing vector store '{}' (M={}, efConstruction={})",
            store.config.collection_name, store.config.m, store.config.ef_construction
        );
        Ok(store)
    }

    /// Insert a vector into the in-memory graph. Nothing is written until
    /// `save_index`.
    pub fn insert(&self, vector: Vec<f32>) -> StoreResult<NodeId> {
        self.check_usable("insert")?;
        self.engine
            .write()
            .insert(vector)
            .map_err(|e| StoreError::graph(&self.config.collection_name, e))
    }

    /// The `k` nearest stored vectors to `target`, by ascending distance.
    ///
    /// Served from memory only; never triggers a load.
    pub fn query(&self, target: &[f32], k: usize) -> StoreResult<Vec<VectorResult>> {
        self.check_usable("query")?;
        self.engine
            .read()
            .query(target, k)
            .map_err(|e| StoreError::graph(&self.config.collection_name, e))
    }

    /// `query` with the default result count of 3.
    pub fn query_default(&self, target: &[f32]) -> StoreResult<Vec<VectorResult>> {
        self.query(target, DEFAULT_QUERY_K)
    }
}

impl<G: GraphEngine> VectorStore<G> {
    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.read().state()
    }

    /// Collection name.
    pub fn collection_name(&self) -> &str {
        &self.config.collection_name
    }

    /// Collection configuration.
    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Store configuration.
    pub fn store_config(&self) -> &StoreConfig {
        &self.store_config
    }

    /// Number of nodes in the in-memory graph.
    pub fn len(&self) -> usize {
        self.engine.read().len()
    }

    /// Whether the in-memory graph is empty.
    pub fn is_empty(&self) -> bool {
        self.engine.read().is_empty()
    }

    /// Copy of the in-memory node table.
    pub fn snapshot_nodes(&self) -> NodeTable {
        self.engine.read().nodes().clone()
    }

    /// Wait for exclusive access to the durable namespaces.
    async fn lock_ops(&self) -> OpGuard {
        Arc::clone(&self.op_lock).lock_owned().await
    }

    /// Fail unless the coordinator is `Ready`.
    fn check_usable(&self, operation: &'static str) -> StoreResult<()> {
        match self.state() {
            LifecycleState::Ready => Ok(()),
            LifecycleState::Deleted => Err(self.deleted_error(operation)),
            LifecycleState::Uninitialized | LifecycleState::Initializing => {
                Err(self.uninitialized_error(operation))
            }
        }
    }

    /// Shared handle to the open database, if `Ready`.
    fn ready_db(&self, operation: &'static str) -> StoreResult<Arc<CollectionDb>> {
        match &*self.lifecycle.read() {
            Lifecycle::Ready(db) => Ok(Arc::clone(db)),
            Lifecycle::Deleted => Err(self.deleted_error(operation)),
            Lifecycle::Uninitialized | Lifecycle::Initializing => {
                Err(self.uninitialized_error(operation))
            }
        }
    }

    fn deleted_error(&self, operation: &'static str) -> StoreError {
        StoreError::Deleted {
            collection: self.config.collection_name.clone(),
            operation,
        }
    }

    fn uninitialized_error(&self, operation: &'static str) -> StoreError {
        StoreError::StoreUninitialized {
            collection: self.config.collection_name.clone(),
            operation,
        }
    }
}
