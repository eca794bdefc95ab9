//! Insertion, linking, and pruning for the HNSW graph.

use rand::Rng;
use tracing::trace;

use super::{HnswGraph, MAX_LEVEL};
use crate::distance::euclidean;
use crate::types::{HnswNode, NodeId};

impl HnswGraph {
    /// Draw a level from the exponential distribution `floor(-ln(U) * ml)`.
    pub(super) fn random_level(&mut self) -> usize {
        // 1 - [0, 1) keeps U away from zero.
        let uniform: f64 = 1.0 - self.rng.gen::<f64>();
        let level = (-uniform.ln() * self.ml).floor() as usize;
        level.min(MAX_LEVEL)
    }

    /// Insert a vector that already passed validation.
    pub(super) fn insert_validated(&mut self, vector: Vec<f32>) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.dimension.get_or_insert(vector.len());

        let level = self.random_level();
        let node = HnswNode::new(id, level, vector);

        let Some(entry) = self.entry_point else {
            self.nodes.insert(id, node);
            self.entry_point = Some(id);
            self.max_level = level;
            trace!("HNSW first node {} at level {}", id, level);
            return id;
        };

        let target = node.vector.clone();
        self.nodes.insert(id, node);

        let mut nearest = vec![self.descend(&target, entry, self.max_level, level)];

        for layer in (0..=level.min(self.max_level)).rev() {
            let found = self.search_layer(&target, &nearest, self.ef_construction, layer);
            let selected: Vec<NodeId> = found
                .iter()
                .filter(|c| c.id != id)
                .take(self.layer_capacity(layer))
                .map(|c| c.id)
                .collect();

            self.connect(id, layer, &selected);

            let next: Vec<NodeId> = found.iter().filter(|c| c.id != id).map(|c| c.id).collect();
            if !next.is_empty() {
                nearest = next;
            }
        }

        if level > self.max_level {
            self.max_level = level;
            self.entry_point = Some(id);
        }

        trace!("HNSW inserted node {} at level {}", id, level);
        id
    }

    /// Link `id` to `selected` at `layer` and add the reverse links,
    /// pruning any neighbor that goes over capacity.
    fn connect(&mut self, id: NodeId, layer: usize, selected: &[NodeId]) {
        if let Some(list) = self
            .nodes
            .get_mut(&id)
            .and_then(|node| node.neighbors.get_mut(layer))
        {
            *list = selected.to_vec();
        }

        let capacity = self.layer_capacity(layer);
        for &neighbor_id in selected {
            let overflow = {
                let Some(neighbor) = self.nodes.get_mut(&neighbor_id) else {
                    continue;
                };
                let Some(list) = neighbor.neighbors.get_mut(layer) else {
                    continue;
                };
                if list.contains(&id) {
                    continue;
                }
                list.push(id);
                if list.len() <= capacity {
                    continue;
                }
                (neighbor.vector.clone(), list.clone())
            };

            let (base, links) = overflow;
            let kept = self.nearest_of(&base, &links, capacity);
            if let Some(list) = self
                .nodes
                .get_mut(&neighbor_id)
                .and_then(|node| node.neighbors.get_mut(layer))
            {
                *list = kept;
            }
        }
    }

    /// The `limit` ids from `ids` closest to `base`.
    fn nearest_of(&self, base: &[f32], ids: &[NodeId], limit: usize) -> Vec<NodeId> {
        let mut scored: Vec<(f32, NodeId)> = ids
            .iter()
            .filter_map(|&id| {
                self.nodes
                    .get(&id)
                    .map(|node| (euclidean(base, &node.vector), id))
            })
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        scored.into_iter().take(limit).map(|(_, id)| id).collect()
    }
}
