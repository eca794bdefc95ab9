//! Storage error types for the vector store.
//!
//! Every variant names the collection it concerns, and lifecycle variants also
//! name the operation that was refused, so a caller can decide between
//! retrying, re-saving, or abandoning the collection.
//!
//! # Error Categories
//!
//! - **Lifecycle**: `StoreUninitialized`, `Deleted`, `StoreInitError`, `PurgeFailed`
//! - **Index State**: `IndexMissing`, `IndexCorrupt`, `AlreadyExists`
//! - **Configuration**: `ConfigMismatch`, `InvalidConfig`
//! - **Backend**: `RocksDbOperation`, `ColumnFamilyNotFound`, `Serialization`, `TaskFailed`
//! - **Engine**: `Graph`
//!
//! # Example: Error Handling Pattern
//!
//! ```rust
//! use vector_store_storage::StoreError;
//!
//! fn describe(err: &StoreError) -> &'static str {
//!     match err {
//!         StoreError::IndexMissing { .. } => "nothing saved yet - build and save first",
//!         StoreError::IndexCorrupt { .. } => "durable index damaged - rebuild and resave",
//!         StoreError::ConfigMismatch { .. } => "reopen with the stored parameters",
//!         StoreError::Deleted { .. } => "collection deleted - call create() again",
//!         _ => "see error message",
//!     }
//! }
//!
//! let err = StoreError::IndexMissing { collection: "docs".to_string() };
//! assert_eq!(describe(&err), "nothing saved yet - build and save first");
//! ```

use thiserror::Error;
use vector_store_core::{GraphError, NodeId};

/// Result type for vector store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Vector store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Operation attempted while the durable namespaces are not open.
    #[error("Vector store '{collection}' is uninitialized; cannot {operation}")]
    StoreUninitialized {
        collection: String,
        operation: &'static str,
    },

    /// Operation attempted after `delete_index` succeeded.
    ///
    /// Deletion is terminal for a coordinator instance. A new collection
    /// requires an explicit `VectorStore::create` call.
    #[error("Vector store '{collection}' has been deleted; cannot {operation}")]
    Deleted {
        collection: String,
        operation: &'static str,
    },

    /// `load_index` found no node records.
    #[error("Vector store index for '{collection}' is missing: no node records stored")]
    IndexMissing { collection: String },

    /// A stored record or metadata entry violates a structural invariant.
    #[error("Vector store index for '{collection}' is corrupt at key '{key}': {reason}")]
    IndexCorrupt {
        collection: String,
        key: String,
        reason: String,
    },

    /// Stored metadata disagrees with the requested construction parameters.
    #[error(
        "Configuration mismatch for '{collection}': stored {key}={stored}, requested {requested}"
    )]
    ConfigMismatch {
        collection: String,
        key: &'static str,
        stored: String,
        requested: String,
    },

    /// Durable deletion could not complete.
    #[error("Failed to purge vector store '{collection}' at '{path}': {message}")]
    PurgeFailed {
        collection: String,
        path: String,
        message: String,
    },

    /// `create_index` found existing records and no overwrite was requested.
    #[error("Vector store index for '{collection}' already exists with {records} node records")]
    AlreadyExists { collection: String, records: usize },

    /// The durable namespaces could not be opened or created.
    #[error("Failed to initialize vector store '{collection}' at '{path}': {message}")]
    StoreInitError {
        collection: String,
        path: String,
        message: String,
    },

    /// RocksDB operation failed.
    #[error("RocksDB {operation} failed on CF '{cf}' for '{collection}' with key '{key:?}': {source}")]
    RocksDbOperation {
        collection: String,
        operation: &'static str,
        cf: &'static str,
        key: Option<String>,
        #[source]
        source: rocksdb::Error,
    },

    /// Column family not found.
    #[error("Column family '{name}' not found in database")]
    ColumnFamilyNotFound { name: String },

    /// A node record could not be encoded.
    #[error("Serialization error for '{collection}' node {id}: {message}")]
    Serialization {
        collection: String,
        id: NodeId,
        message: String,
    },

    /// Invalid store or collection configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A blocking storage task panicked or was cancelled.
    #[error("Storage task for {operation} on '{collection}' failed: {message}")]
    TaskFailed {
        collection: String,
        operation: &'static str,
        message: String,
    },

    /// The graph engine rejected the request.
    #[error("Graph engine error for '{collection}': {source}")]
    Graph {
        collection: String,
        #[source]
        source: GraphError,
    },
}

impl StoreError {
    /// Create a RocksDB operation error.
    pub fn rocksdb_op(
        collection: &str,
        operation: &'static str,
        cf: &'static str,
        key: Option<&str>,
        source: rocksdb::Error,
    ) -> Self {
        Self::RocksDbOperation {
            collection: collection.to_string(),
            operation,
            cf,
            key: key.map(str::to_string),
            source,
        }
    }

    /// Create an index corruption error.
    pub fn corrupt(collection: &str, key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IndexCorrupt {
            collection: collection.to_string(),
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a graph engine error.
    pub fn graph(collection: &str, source: GraphError) -> Self {
        Self::Graph {
            collection: collection.to_string(),
            source,
        }
    }

    /// Wrap a failed blocking task.
    pub fn task(collection: &str, operation: &'static str, err: tokio::task::JoinError) -> Self {
        Self::TaskFailed {
            collection: collection.to_string(),
            operation,
            message: err.to_string(),
        }
    }

    /// Name of the collection this error concerns, if any.
    pub fn collection(&self) -> Option<&str> {
        match self {
            Self::StoreUninitialized { collection, .. }
            | Self::Deleted { collection, .. }
            | Self::IndexMissing { collection }
            | Self::IndexCorrupt { collection, .. }
            | Self::ConfigMismatch { collection, .. }
            | Self::PurgeFailed { collection, .. }
            | Self::AlreadyExists { collection, .. }
            | Self::StoreInitError { collection, .. }
            | Self::RocksDbOperation { collection, .. }
            | Self::Serialization { collection, .. }
            | Self::TaskFailed { collection, .. }
            | Self::Graph { collection, .. } => Some(collection.as_str()),
            Self::ColumnFamilyNotFound { .. } | Self::InvalidConfig { .. } => None,
        }
    }

    /// Whether retrying the same operation unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RocksDbOperation { .. }
                | Self::TaskFailed { .. }
                | Self::PurgeFailed { .. }
                | Self::StoreInitError { .. }
        )
    }

    /// Whether the durable index may now hold a mix of old and new records
    /// and must be fully re-saved before it is trusted.
    pub fn requires_resave(&self) -> bool {
        match self {
            Self::RocksDbOperation { operation, .. } => {
                matches!(*operation, "put" | "write_batch" | "delete")
            }
            Self::TaskFailed { operation, .. } => *operation == "save_index",
            Self::IndexCorrupt { .. } => true,
            _ => false,
        }
    }
}
