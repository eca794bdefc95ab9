//! The graph engine contract consumed by the persistence layer.
//!
//! The storage crate never reimplements insertion or search. It enumerates
//! the node table for saves and swaps it wholesale on loads; everything else
//! goes through this trait.

use crate::error::GraphResult;
use crate::types::{NodeId, NodeTable, VectorResult};

/// An in-memory ANN graph that owns its node table.
pub trait GraphEngine: Send + Sync {
    /// Build an empty engine with the given construction parameters.
    fn new(m: usize, ef_construction: usize) -> Self
    where
        Self: Sized;

    /// Maximum neighbors per layer.
    fn m(&self) -> usize;

    /// Candidate list size used during construction.
    fn ef_construction(&self) -> usize;

    /// Override the candidate list size used during queries.
    fn set_ef_search(&mut self, _ef_search: usize) {}

    /// Fixed vector dimension, `None` until the first vector arrives.
    fn dimension(&self) -> Option<usize>;

    /// Insert a vector and return its new id.
    fn insert(&mut self, vector: Vec<f32>) -> GraphResult<NodeId>;

    /// Return up to `k` nearest nodes ordered by ascending distance.
    fn query(&self, target: &[f32], k: usize) -> GraphResult<Vec<VectorResult>>;

    /// Read-only view of the node table.
    fn nodes(&self) -> &NodeTable;

    /// Replace the node table wholesale and rebuild derived state.
    ///
    /// The caller guarantees the table is internally consistent.
    fn replace_nodes(&mut self, nodes: NodeTable);

    /// Number of nodes.
    fn len(&self) -> usize {
        self.nodes().len()
    }

    /// Whether the graph holds no nodes.
    fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }
}
