//! Vector Store Storage Layer
//!
//! RocksDB persistence and lifecycle coordination for HNSW vector
//! collections.
//!
//! # Architecture
//!
//! Each collection is one RocksDB directory at `<data_dir>/<collection_name>`
//! with two column families:
//! - `meta` - the collection configuration (`efConstruction`, `neighbors`,
//!   `collectionName`)
//! - `index` - one bincode `NodeRecord` per graph node, keyed by decimal id
//!
//! [`VectorStore`] owns the open database and an in-memory
//! [`GraphEngine`](vector_store_core::GraphEngine). Inserts and queries hit
//! memory only; [`IndexPersistence`] moves the node table to and from disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use vector_store_core::CollectionConfig;
//! use vector_store_storage::{IndexPersistence, StoreConfig, VectorStore};
//!
//! let store: VectorStore = VectorStore::create(
//!     CollectionConfig::new("docs"),
//!     StoreConfig::with_data_dir("./data"),
//! )
//! .await?;
//! store.insert(vec![1.0, 0.0, 0.0])?;
//! store.save_index().await?;
//! ```

pub mod collection;
pub mod column_families;
pub mod config;
pub mod error;
pub mod schema;
pub mod serialization;
pub mod traits;
pub mod vector_store;

pub use collection::{destroy_collection, CollectionDb};
pub use column_families::{CF_INDEX, CF_META, VECTOR_STORE_CFS};
pub use config::{SaveMode, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use schema::MetaKey;
pub use serialization::NodeRecord;
pub use traits::IndexPersistence;
pub use vector_store::{LifecycleState, VectorStore};
