//! Round-Trip Tests
//!
//! save -> reopen -> load reproduces the node table exactly, in both save
//! modes, and the durable state always mirrors the last saved table.

use tempfile::TempDir;
use vector_store_core::CollectionConfig;
use vector_store_storage::{
    IndexPersistence, NodeRecord, StoreConfig, StoreError, VectorStore, CF_INDEX,
};

use crate::common::{
    create_store, init_tracing, insert_all, per_record_config, random_vectors, store_config,
};

async fn round_trip(count: usize, dim: usize, config: StoreConfig) {
    init_tracing();
    let collection = CollectionConfig::new("rt");

    let store: VectorStore = VectorStore::create(collection.clone(), config.clone())
        .await
        .expect("create");
    insert_all(&store, &random_vectors(count, dim, count as u64));
    let original = store.snapshot_nodes();

    let saved = store.save_index().await.expect("save");
    println!("[1] saved {} records ({:?})", saved, config.save_mode);
    assert_eq!(saved, count);
    drop(store);

    let reopened: VectorStore = VectorStore::create(collection, config)
        .await
        .expect("reopen");
    let loaded = reopened.load_index().await.expect("load");
    println!("[2] loaded {} records", loaded);

    assert_eq!(loaded, count);
    assert_eq!(reopened.snapshot_nodes(), original);
}

// =========================================================================
// Round Trip
// =========================================================================

#[tokio::test]
async fn test_round_trip_single_node() {
    let tmp = TempDir::new().expect("create temp dir");
    round_trip(1, 3, store_config(&tmp)).await;
}

#[tokio::test]
async fn test_round_trip_atomic() {
    println!("=== TEST: 300 nodes, atomic save, reopen, load ===");
    let tmp = TempDir::new().expect("create temp dir");
    round_trip(300, 8, store_config(&tmp)).await;
}

#[tokio::test]
async fn test_round_trip_per_record() {
    println!("=== TEST: 300 nodes, per-record save across 4 tasks ===");
    let tmp = TempDir::new().expect("create temp dir");
    round_trip(300, 8, per_record_config(&tmp, 4)).await;
}

#[tokio::test]
async fn test_round_trip_per_record_more_workers_than_nodes() {
    let tmp = TempDir::new().expect("create temp dir");
    round_trip(3, 2, per_record_config(&tmp, 16)).await;
}

#[tokio::test]
async fn test_round_trip_empty_table() {
    println!("=== TEST: N=0 saves nothing and loads as IndexMissing ===");
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "empty").await;

    assert_eq!(store.save_index().await.unwrap(), 0);
    assert_eq!(store.stored_record_count().await.unwrap(), 0);

    let err = store.load_index().await.unwrap_err();
    assert!(matches!(err, StoreError::IndexMissing { .. }));
    assert!(store.is_empty(), "table still equals the empty original");
}

#[tokio::test]
async fn test_records_are_keyed_by_decimal_id() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "keys").await;
    let ids = insert_all(&store, &random_vectors(12, 3, 9));
    store.save_index().await.unwrap();

    let nodes = store.snapshot_nodes();
    for id in ids {
        let raw = store
            .get_raw_bytes(CF_INDEX, id.to_string().as_bytes())
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("record {} missing", id));
        let record: NodeRecord = bincode::deserialize(&raw).expect("bincode record");
        assert_eq!(record.id, id);
        assert_eq!(record.clone().into_node(), nodes[&id]);
    }
}

// =========================================================================
// Idempotent Save
// =========================================================================

#[tokio::test]
async fn test_save_twice_is_idempotent() {
    println!("=== TEST: save, save again -> identical durable bytes ===");
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "idem").await;
    let ids = insert_all(&store, &random_vectors(50, 4, 10));

    store.save_index().await.unwrap();
    let mut first = Vec::new();
    for id in &ids {
        first.push(
            store
                .get_raw_bytes(CF_INDEX, id.to_string().as_bytes())
                .await
                .unwrap(),
        );
    }

    store.save_index().await.unwrap();
    let mut second = Vec::new();
    for id in &ids {
        second.push(
            store
                .get_raw_bytes(CF_INDEX, id.to_string().as_bytes())
                .await
                .unwrap(),
        );
    }

    assert_eq!(first, second);
    assert_eq!(store.stored_record_count().await.unwrap(), 50);
}

#[tokio::test]
async fn test_save_after_more_inserts_updates_neighbors() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "grow").await;
    insert_all(&store, &random_vectors(20, 4, 11));
    store.save_index().await.unwrap();

    insert_all(&store, &random_vectors(20, 4, 12));
    store.save_index().await.unwrap();
    let expected = store.snapshot_nodes();
    drop(store);

    let reopened = create_store(&tmp, "grow").await;
    assert_eq!(reopened.load_index().await.unwrap(), 40);
    assert_eq!(reopened.snapshot_nodes(), expected);
}

// =========================================================================
// Stale Record Removal
// =========================================================================

async fn assert_stale_records_removed(config: StoreConfig) {
    init_tracing();
    let collection = CollectionConfig::new("mirror");

    let big: VectorStore = VectorStore::create(collection.clone(), config.clone())
        .await
        .unwrap();
    insert_all(&big, &random_vectors(10, 3, 13));
    big.save_index().await.unwrap();
    drop(big);

    // A fresh coordinator with a smaller table overwrites ids 0..3 and must
    // remove 3..10.
    let small: VectorStore = VectorStore::create(collection, config).await.unwrap();
    insert_all(&small, &random_vectors(3, 3, 14));
    small.save_index().await.unwrap();

    assert_eq!(small.stored_record_count().await.unwrap(), 3);
    assert!(small.get_raw_bytes(CF_INDEX, b"5").await.unwrap().is_none());

    let expected = small.snapshot_nodes();
    assert_eq!(small.load_index().await.unwrap(), 3);
    assert_eq!(small.snapshot_nodes(), expected);
}

#[tokio::test]
async fn test_stale_records_removed_atomic() {
    let tmp = TempDir::new().expect("create temp dir");
    assert_stale_records_removed(store_config(&tmp)).await;
}

#[tokio::test]
async fn test_stale_records_removed_per_record() {
    let tmp = TempDir::new().expect("create temp dir");
    assert_stale_records_removed(per_record_config(&tmp, 2)).await;
}

// =========================================================================
// Query Independence
// =========================================================================

#[tokio::test]
async fn test_query_works_without_saving() {
    println!("=== TEST: unsaved inserts are queryable; nothing written ===");
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "volatile").await;
    insert_all(&store, &[vec![0.0, 0.0], vec![5.0, 5.0], vec![1.0, 0.0]]);

    let results = store.query(&[0.9, 0.0], 1).unwrap();
    assert_eq!(results[0].id, 2);
    assert_eq!(store.stored_record_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_query_answers_survive_round_trip() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "answers").await;
    insert_all(&store, &random_vectors(200, 6, 15));
    let target = random_vectors(1, 6, 16).remove(0);
    let before = store.query(&target, 5).unwrap();
    store.save_index().await.unwrap();
    drop(store);

    let reopened = create_store(&tmp, "answers").await;
    assert!(
        reopened.query(&target, 5).unwrap().is_empty(),
        "no implicit load"
    );
    reopened.load_index().await.unwrap();
    assert_eq!(reopened.query(&target, 5).unwrap(), before);
}
