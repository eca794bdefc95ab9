//! Corruption Tests
//!
//! Damaged durable state is reported as `IndexCorrupt` (or `IndexMissing`)
//! and never reaches the in-memory table.

use tempfile::TempDir;
use vector_store_storage::{IndexPersistence, NodeRecord, StoreError, VectorStore, CF_INDEX, CF_META};

use crate::common::{create_store, insert_all, random_vectors};

/// A store with 20 saved nodes and 5 extra unsaved ones in memory.
async fn saved_store(tmp: &TempDir) -> VectorStore {
    let store = create_store(tmp, "damaged").await;
    insert_all(&store, &random_vectors(20, 4, 21));
    store.save_index().await.expect("save");
    insert_all(&store, &random_vectors(5, 4, 22));
    store
}

async fn assert_load_rejected(store: &VectorStore, expected_key: &str) {
    let before = store.snapshot_nodes();

    let err = store.load_index().await.unwrap_err();
    println!("AFTER: load error = {}", err);

    match &err {
        StoreError::IndexCorrupt { collection, key, .. } => {
            assert_eq!(collection, "damaged");
            assert_eq!(key, expected_key);
        }
        other => panic!("Expected IndexCorrupt, got {:?}", other),
    }
    assert!(err.requires_resave());
    assert_eq!(store.snapshot_nodes(), before, "table untouched on failure");
    assert_eq!(store.len(), 25);
}

fn encode(record: &NodeRecord) -> Vec<u8> {
    bincode::serialize(record).expect("encode")
}

// =========================================================================
// Record Corruption
// =========================================================================

#[tokio::test]
async fn test_layer_count_mismatch_detected() {
    println!("=== TEST: neighbors.len() != level + 1 -> IndexCorrupt ===");
    let tmp = TempDir::new().expect("create temp dir");
    let store = saved_store(&tmp).await;

    let bad = NodeRecord {
        id: 3,
        level: 2,
        vector: vec![0.1, 0.2, 0.3, 0.4],
        neighbors: vec![vec![1]],
    };
    store.put_raw_bytes(CF_INDEX, b"3", &encode(&bad)).await.unwrap();

    assert_load_rejected(&store, "3").await;
}

#[tokio::test]
async fn test_dangling_neighbor_detected() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = saved_store(&tmp).await;

    let bad = NodeRecord {
        id: 4,
        level: 0,
        vector: vec![0.1, 0.2, 0.3, 0.4],
        neighbors: vec![vec![1, 9999]],
    };
    store.put_raw_bytes(CF_INDEX, b"4", &encode(&bad)).await.unwrap();

    assert_load_rejected(&store, "4").await;
}

#[tokio::test]
async fn test_truncated_record_detected() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = saved_store(&tmp).await;

    let raw = store
        .get_raw_bytes(CF_INDEX, b"7")
        .await
        .unwrap()
        .expect("record 7");
    store
        .put_raw_bytes(CF_INDEX, b"7", &raw[..raw.len() / 2])
        .await
        .unwrap();

    assert_load_rejected(&store, "7").await;
}

#[tokio::test]
async fn test_key_and_id_disagreement_detected() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = saved_store(&tmp).await;

    let raw = store
        .get_raw_bytes(CF_INDEX, b"2")
        .await
        .unwrap()
        .expect("record 2");
    store.put_raw_bytes(CF_INDEX, b"8", &raw).await.unwrap();

    assert_load_rejected(&store, "8").await;
}

#[tokio::test]
async fn test_foreign_key_detected() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = saved_store(&tmp).await;
    store
        .put_raw_bytes(CF_INDEX, b"not-a-node", b"junk")
        .await
        .unwrap();

    assert_load_rejected(&store, "not-a-node").await;
}

#[tokio::test]
async fn test_wrong_dimension_detected() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = saved_store(&tmp).await;

    let raw = store
        .get_raw_bytes(CF_INDEX, b"5")
        .await
        .unwrap()
        .expect("record 5");
    let mut record: NodeRecord = bincode::deserialize(&raw).unwrap();
    record.vector.push(1.0);
    store.put_raw_bytes(CF_INDEX, b"5", &encode(&record)).await.unwrap();

    let before = store.snapshot_nodes();
    let err = store.load_index().await.unwrap_err();
    assert!(matches!(err, StoreError::IndexCorrupt { .. }));
    assert_eq!(store.snapshot_nodes(), before);
}

// =========================================================================
// Metadata Corruption
// =========================================================================

#[tokio::test]
async fn test_undecodable_metadata_detected() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = saved_store(&tmp).await;
    store
        .put_raw_bytes(CF_META, b"neighbors", b"sixteen")
        .await
        .unwrap();

    assert_load_rejected(&store, "neighbors").await;
}

#[tokio::test]
async fn test_resave_repairs_corruption() {
    println!("=== TEST: a full save overwrites damaged records ===");
    let tmp = TempDir::new().expect("create temp dir");
    let store = saved_store(&tmp).await;
    store.put_raw_bytes(CF_INDEX, b"3", b"junk").await.unwrap();
    assert!(store.load_index().await.is_err());

    store.save_index().await.expect("resave");
    assert_eq!(store.load_index().await.unwrap(), 25);
}
