//! Durable encodings for node records and metadata values.
//!
//! # Formats
//!
//! - `NodeRecord`: bincode, fixed-width little-endian integers, no trailing bytes
//! - Integer metadata: 8-byte little-endian `u64`
//! - String metadata: UTF-8 bytes
//!
//! Decoding never panics. Malformed bytes come back as `Err(reason)` so the
//! caller can report `IndexCorrupt` with the offending key.

use bincode::Options;
use serde::{Deserialize, Serialize};
use vector_store_core::{HnswNode, NodeId};

use crate::error::{StoreError, StoreResult};

/// Durable form of one graph node.
///
/// Vectors and neighbor lists are owned copies; a record never aliases the
/// engine's live table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub level: u32,
    pub vector: Vec<f32>,
    pub neighbors: Vec<Vec<NodeId>>,
}

impl NodeRecord {
    /// Copy a node into record form.
    ///
    /// # Errors
    /// `StoreError::Serialization` if the level does not fit in a `u32`.
    pub fn from_node(collection: &str, node: &HnswNode) -> StoreResult<Self> {
        let level = u32::try_from(node.level).map_err(|_| StoreError::Serialization {
            collection: collection.to_string(),
            id: node.id,
            message: format!("level {} exceeds u32", node.level),
        })?;
        Ok(Self {
            id: node.id,
            level,
            vector: node.vector.iter().copied().collect(),
            neighbors: node.neighbors.iter().map(|layer| layer.to_vec()).collect(),
        })
    }

    /// Convert into the engine's node type.
    pub fn into_node(self) -> HnswNode {
        HnswNode {
            id: self.id,
            level: self.level as usize,
            vector: self.vector,
            neighbors: self.neighbors,
        }
    }

    /// Check the per-record invariants that need no other record.
    ///
    /// Returns the first violation as a human-readable reason.
    pub fn check_shape(&self) -> Result<(), String> {
        let expected = self.level as usize + 1;
        if self.neighbors.len() != expected {
            return Err(format!(
                "neighbors has {} layers, level {} requires {}",
                self.neighbors.len(),
                self.level,
                expected
            ));
        }
        if self.vector.is_empty() {
            return Err("vector is empty".to_string());
        }
        if let Some((index, value)) = self
            .vector
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(format!("vector component {} is not finite: {}", index, value));
        }
        if let Some(layer) = self
            .neighbors
            .iter()
            .position(|links| links.contains(&self.id))
        {
            return Err(format!("node links to itself at layer {}", layer));
        }
        Ok(())
    }
}

fn record_options(limit: u64) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
        .with_limit(limit)
}

/// Serialize a record with bincode.
///
/// # Errors
/// `StoreError::Serialization` if encoding fails.
pub fn serialize_record(collection: &str, record: &NodeRecord) -> StoreResult<Vec<u8>> {
    record_options(u64::MAX)
        .serialize(record)
        .map_err(|e| StoreError::Serialization {
            collection: collection.to_string(),
            id: record.id,
            message: e.to_string(),
        })
}

/// Deserialize a record.
///
/// The byte length bounds every length prefix, so a corrupt prefix cannot
/// trigger a huge allocation.
pub fn deserialize_record(bytes: &[u8]) -> Result<NodeRecord, String> {
    record_options(bytes.len() as u64)
        .deserialize(bytes)
        .map_err(|e| format!("undecodable record: {}", e))
}

/// Encode an integer metadata value.
#[inline]
pub fn encode_meta_u64(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Decode an integer metadata value.
pub fn decode_meta_u64(bytes: &[u8]) -> Result<u64, String> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| format!("expected 8 bytes, found {}", bytes.len()))?;
    Ok(u64::from_le_bytes(array))
}

/// Decode a string metadata value.
pub fn decode_meta_str(bytes: &[u8]) -> Result<String, String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| format!("invalid UTF-8: {}", e))
}
