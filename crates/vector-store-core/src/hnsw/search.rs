//! Per-layer search for the HNSW graph.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use super::HnswGraph;
use crate::distance::euclidean;
use crate::types::NodeId;

/// A node paired with its distance to the current target.
///
/// Ordered by distance, then id, so heaps behave deterministically.
#[derive(Debug, Clone, Copy)]
pub(super) struct Candidate {
    pub distance: f32,
    pub id: NodeId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl HnswGraph {
    /// Distance from `target` to node `id`, if the node exists.
    #[inline]
    pub(super) fn distance_to(&self, target: &[f32], id: NodeId) -> Option<f32> {
        self.nodes.get(&id).map(|node| euclidean(target, &node.vector))
    }

    /// Greedy descent from `entry` through layers `from_layer` down to
    /// `to_layer + 1`, returning the closest node found.
    pub(super) fn descend(
        &self,
        target: &[f32],
        entry: NodeId,
        from_layer: usize,
        to_layer: usize,
    ) -> NodeId {
        let mut current = entry;
        for layer in (to_layer + 1..=from_layer).rev() {
            if let Some(best) = self.search_layer(target, &[current], 1, layer).first() {
                current = best.id;
            }
        }
        current
    }

    /// Beam search of width `ef` on a single layer.
    ///
    /// Returns candidates sorted by ascending distance.
    pub(super) fn search_layer(
        &self,
        target: &[f32],
        entry_points: &[NodeId],
        ef: usize,
        layer: usize,
    ) -> Vec<Candidate> {
        let mut visited: HashSet<NodeId> =
            HashSet::with_capacity(ef.min(self.nodes.len()).saturating_mul(4));
        let mut candidates: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        let mut results: BinaryHeap<Candidate> = BinaryHeap::new();

        for &ep in entry_points {
            if !visited.insert(ep) {
                continue;
            }
            if let Some(distance) = self.distance_to(target, ep) {
                let candidate = Candidate { distance, id: ep };
                candidates.push(Reverse(candidate));
                results.push(candidate);
            }
        }
        while results.len() > ef {
            results.pop();
        }

        while let Some(Reverse(current)) = candidates.pop() {
            if let Some(furthest) = results.peek() {
                if results.len() >= ef && current.distance > furthest.distance {
                    break;
                }
            }

            let Some(neighbors) = self
                .nodes
                .get(&current.id)
                .and_then(|node| node.neighbors.get(layer))
            else {
                continue;
            };

            for &neighbor_id in neighbors {
                if !visited.insert(neighbor_id) {
                    continue;
                }
                let Some(distance) = self.distance_to(target, neighbor_id) else {
                    continue;
                };

                let improves = results.len() < ef
                    || results.peek().is_some_and(|furthest| distance < furthest.distance);
                if improves {
                    let candidate = Candidate {
                        distance,
                        id: neighbor_id,
                    };
                    candidates.push(Reverse(candidate));
                    results.push(candidate);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        results.into_sorted_vec()
    }
}
