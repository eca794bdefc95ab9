//! Key formats for the vector store column families.
//!
//! # Key Formats
//!
//! | CF | Key Format | Example |
//! |----|------------|---------|
//! | meta | fixed metadata key name | `"neighbors"` |
//! | index | node id as a decimal string | `"42"` |
//!
//! Node keys are decimal strings rather than fixed-width integers so the
//! durable layout stays readable by tools that only see the raw store.
//! Iteration order over the index CF is therefore lexicographic, not numeric;
//! nothing relies on it.

use vector_store_core::NodeId;

/// Keys of the metadata column family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKey {
    /// Candidate list size used during construction (u64).
    EfConstruction,
    /// Maximum neighbors per layer, `M` (u64).
    Neighbors,
    /// Collection name (UTF-8).
    CollectionName,
}

impl MetaKey {
    /// Every metadata key, in the order they are checked against a request.
    pub const ALL: [MetaKey; 3] = [
        MetaKey::CollectionName,
        MetaKey::Neighbors,
        MetaKey::EfConstruction,
    ];

    /// Durable key string.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            MetaKey::EfConstruction => "efConstruction",
            MetaKey::Neighbors => "neighbors",
            MetaKey::CollectionName => "collectionName",
        }
    }

    /// Durable key bytes.
    #[inline]
    pub fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl std::fmt::Display for MetaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key for the index CF: the node id's decimal string form.
#[inline]
pub fn node_key(id: NodeId) -> String {
    id.to_string()
}

/// Parse an index CF key back to a node id.
///
/// Returns `None` for anything that is not the canonical decimal form of a
/// `u64` (leading zeros, signs, whitespace, or non-UTF-8 bytes), so every
/// stored key maps to exactly one id.
pub fn parse_node_key(key: &[u8]) -> Option<NodeId> {
    let text = std::str::from_utf8(key).ok()?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if text.len() > 1 && text.starts_with('0') {
        return None;
    }
    text.parse::<NodeId>().ok()
}
