//! Domain types shared by the graph engine and the persistence layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Node identifier assigned by the graph engine.
///
/// Ids are stable for the lifetime of a collection and are never reused.
pub type NodeId = u64;

/// The engine's node table, keyed by node id.
pub type NodeTable = HashMap<NodeId, HnswNode>;

/// Number of results returned by a query when the caller does not ask for a
/// specific count.
pub const DEFAULT_QUERY_K: usize = 3;

/// A single node of the HNSW graph.
///
/// `neighbors[layer]` holds the ids this node links to at `layer`, for every
/// layer from 0 up to and including `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswNode {
    /// Engine-assigned identifier.
    pub id: NodeId,
    /// Highest layer this node participates in.
    pub level: usize,
    /// The stored vector.
    pub vector: Vec<f32>,
    /// Per-layer neighbor lists, `level + 1` entries.
    pub neighbors: Vec<Vec<NodeId>>,
}

impl HnswNode {
    /// Create a node with empty neighbor lists for layers `0..=level`.
    #[must_use]
    pub fn new(id: NodeId, level: usize, vector: Vec<f32>) -> Self {
        Self {
            id,
            level,
            vector,
            neighbors: vec![Vec::new(); level + 1],
        }
    }

    /// Whether the neighbor lists cover exactly layers `0..=level`.
    #[must_use]
    pub fn has_consistent_layers(&self) -> bool {
        self.neighbors.len() == self.level + 1
    }

    /// Vector dimension.
    #[inline]
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A single query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorResult {
    /// Id of the matching node.
    pub id: NodeId,
    /// Distance from the query target (lower is closer).
    pub distance: f32,
    /// Copy of the matching node's vector.
    pub vector: Vec<f32>,
}
