//! Structural validation of stored node records.
//!
//! A table is only handed to the engine after every record has passed. Checks
//! that need the whole table (dangling neighbor ids, uniform dimension) run
//! after every record has been read.

use tracing::warn;
use vector_store_core::{NodeId, NodeTable};

use crate::collection::RawRecord;
use crate::error::{StoreError, StoreResult};
use crate::schema::{node_key, parse_node_key};
use crate::serialization::deserialize_record;

/// Decode and validate raw index records into a node table.
///
/// # Errors
/// - `StoreError::IndexMissing` if `raw` is empty
/// - `StoreError::IndexCorrupt` naming the first offending key
pub(crate) fn validate_records(collection: &str, raw: Vec<RawRecord>) -> StoreResult<NodeTable> {
    if raw.is_empty() {
        return Err(StoreError::IndexMissing {
            collection: collection.to_string(),
        });
    }

    let corrupt = |key: &str, reason: String| {
        warn!("Corrupt record '{}' in '{}': {}", key, collection, reason);
        StoreError::corrupt(collection, key, reason)
    };

    let mut table = NodeTable::with_capacity(raw.len());
    let mut dimension: Option<(usize, NodeId)> = None;

    for (key, value) in raw {
        let key_text = String::from_utf8_lossy(&key).into_owned();

        let Some(id) = parse_node_key(&key) else {
            return Err(corrupt(&key_text, "key is not a node id".to_string()));
        };
        let record = deserialize_record(&value).map_err(|reason| corrupt(&key_text, reason))?;
        if record.id != id {
            return Err(corrupt(
                &key_text,
                format!("record id {} does not match key", record.id),
            ));
        }
        record
            .check_shape()
            .map_err(|reason| corrupt(&key_text, reason))?;

        match dimension {
            None => dimension = Some((record.vector.len(), id)),
            Some((expected, first)) if expected != record.vector.len() => {
                return Err(corrupt(
                    &key_text,
                    format!(
                        "vector has dimension {}, node {} has {}",
                        record.vector.len(),
                        first,
                        expected
                    ),
                ));
            }
            Some(_) => {}
        }

        table.insert(id, record.into_node());
    }

    let mut ids: Vec<NodeId> = table.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        let Some(node) = table.get(&id) else {
            continue;
        };
        for (layer, links) in node.neighbors.iter().enumerate() {
            if let Some(missing) = links.iter().find(|n| !table.contains_key(*n)) {
                return Err(corrupt(
                    &node_key(id),
                    format!("neighbor {} at layer {} does not exist", missing, layer),
                ));
            }
        }
    }

    Ok(table)
}
