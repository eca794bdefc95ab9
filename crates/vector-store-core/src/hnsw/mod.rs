//! HNSW graph engine.
//!
//! Multi-layer proximity graph after Malkov & Yashunin (2018):
//! - Layer 0 holds every node, upper layers exponentially fewer
//! - Queries descend greedily from the entry point, then beam-search layer 0
//! - Links are bidirectional and pruned nearest-first at capacity
//!
//! # Module Structure
//!
//! - `search` - candidate ordering and per-layer beam search
//! - `insert` - level assignment, linking, and pruning

mod insert;
mod search;


use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::config::DEFAULT_EF_SEARCH;
use crate::engine::GraphEngine;
use crate::error::{GraphError, GraphResult};
use crate::types::{NodeId, NodeTable, VectorResult};

/// Upper bound on a node's level.
const MAX_LEVEL: usize = 16;

/// HNSW implementation of [`GraphEngine`] using Euclidean distance.
#[derive(Debug, Clone)]
pub struct HnswGraph {
    m: usize,
    ef_construction: usize,
    ef_search: usize,
    /// Level normalization factor, `1 / ln(m)`.
    ml: f64,
    nodes: NodeTable,
    entry_point: Option<NodeId>,
    max_level: usize,
    next_id: NodeId,
    dimension: Option<usize>,
    rng: StdRng,
}

impl HnswGraph {
    /// Create an engine whose level assignment is reproducible.
    #[must_use]
    pub fn with_seed(m: usize, ef_construction: usize, seed: u64) -> Self {
        Self::with_rng(m, ef_construction, StdRng::seed_from_u64(seed))
    }

    fn with_rng(m: usize, ef_construction: usize, rng: StdRng) -> Self {
        let m = m.max(2);
        Self {
            m,
            ef_construction: ef_construction.max(1),
            ef_search: DEFAULT_EF_SEARCH,
            ml: 1.0 / (m as f64).ln(),
            nodes: NodeTable::new(),
            entry_point: None,
            max_level: 0,
            next_id: 0,
            dimension: None,
            rng,
        }
    }

    /// Current entry point (highest-level node).
    #[must_use]
    pub fn entry_point(&self) -> Option<NodeId> {
        self.entry_point
    }

    /// Highest layer present in the graph.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Candidate list size used during queries.
    #[must_use]
    pub fn ef_search(&self) -> usize {
        self.ef_search
    }

    /// Link capacity at `layer`: `2 * m` at layer 0, `m` above.
    #[inline]
    fn layer_capacity(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m.saturating_mul(2)
        } else {
            self.m
        }
    }

    /// Check a vector against the graph's dimension and reject non-finite input.
    fn validate_vector(&self, vector: &[f32]) -> GraphResult<()> {
        if vector.is_empty() {
            return Err(GraphError::EmptyVector);
        }
        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(GraphError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        if let Some((index, &value)) = vector.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(GraphError::NonFiniteComponent { index, value });
        }
        Ok(())
    }
}

impl GraphEngine for HnswGraph {
    fn new(m: usize, ef_construction: usize) -> Self {
        Self::with_rng(m, ef_construction, StdRng::from_entropy())
    }

    fn m(&self) -> usize {
        self.m
    }

    fn ef_construction(&self) -> usize {
        self.ef_construction
    }

    fn set_ef_search(&mut self, ef_search: usize) {
        self.ef_search = ef_search.max(1);
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn insert(&mut self, vector: Vec<f32>) -> GraphResult<NodeId> {
        self.validate_vector(&vector)?;
        Ok(self.insert_validated(vector))
    }

    fn query(&self, target: &[f32], k: usize) -> GraphResult<Vec<VectorResult>> {
        self.validate_vector(target)?;

        let Some(entry) = self.entry_point else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let nearest = self.descend(target, entry, self.max_level, 0);
        // A beam wider than the graph visits nothing extra.
        let ef = self.ef_search.max(k).min(self.nodes.len());
        let found = self.search_layer(target, &[nearest], ef, 0);

        let results: Vec<VectorResult> = found
            .into_iter()
            .take(k)
            .filter_map(|c| {
                self.nodes.get(&c.id).map(|node| VectorResult {
                    id: c.id,
                    distance: c.distance,
                    vector: node.vector.clone(),
                })
            })
            .collect();

        debug!("HNSW query k={} returned {} results", k, results.len());
        Ok(results)
    }

    fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    fn replace_nodes(&mut self, nodes: NodeTable) {
        // Highest level wins; ties go to the lowest id so the choice is stable.
        let entry = nodes
            .values()
            .max_by(|a, b| a.level.cmp(&b.level).then_with(|| b.id.cmp(&a.id)))
            .map(|node| (node.id, node.level));

        self.entry_point = entry.map(|(id, _)| id);
        self.max_level = entry.map_or(0, |(_, level)| level);
        self.next_id = nodes.keys().max().map_or(0, |max| max + 1);
        self.dimension = nodes.values().next().map(|node| node.vector.len());
        self.nodes = nodes;

        debug!(
            "HNSW table replaced: {} nodes, max_level={}, next_id={}",
            self.nodes.len(),
            self.max_level,
            self.next_id
        );
    }
}
