//! Vector Store Core Library
//!
//! Domain types and the in-memory graph engine for the persistent HNSW
//! vector store.
//!
//! # Architecture
//!
//! This crate defines:
//! - Domain types (`HnswNode`, `NodeTable`, `VectorResult`)
//! - Collection configuration (`CollectionConfig`)
//! - The `GraphEngine` trait the persistence layer consumes
//! - `HnswGraph`, the HNSW implementation of `GraphEngine`
//! - Error types and result aliases
//!
//! Persistence lives in `vector-store-storage`; nothing in this crate touches
//! disk.
//!
//! # Example
//!
//! ```
//! use vector_store_core::{GraphEngine, HnswGraph};
//!
//! let mut graph = HnswGraph::new(16, 200);
//! let id = graph.insert(vec![1.0, 0.0, 0.0]).unwrap();
//! graph.insert(vec![0.0, 1.0, 0.0]).unwrap();
//!
//! let results = graph.query(&[0.9, 0.1, 0.0], 1).unwrap();
//! assert_eq!(results[0].id, id);
//! ```

pub mod config;
pub mod distance;
pub mod engine;
pub mod error;
pub mod hnsw;
pub mod types;

pub use config::{CollectionConfig, DEFAULT_EF_CONSTRUCTION, DEFAULT_EF_SEARCH, DEFAULT_M};
pub use engine::GraphEngine;
pub use error::{GraphError, GraphResult};
pub use hnsw::HnswGraph;
pub use types::{HnswNode, NodeId, NodeTable, VectorResult, DEFAULT_QUERY_K};
