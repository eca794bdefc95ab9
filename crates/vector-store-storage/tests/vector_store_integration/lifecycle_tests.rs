//! Lifecycle Tests
//!
//! create/open, metadata consistency, and delete finality.

use tempfile::TempDir;
use vector_store_core::CollectionConfig;
use vector_store_storage::{
    destroy_collection, IndexPersistence, LifecycleState, StoreError, VectorStore, CF_META,
};

use crate::common::{create_store, init_tracing, insert_all, random_vectors, store_config};

// =========================================================================
// Create / Open
// =========================================================================

#[tokio::test]
async fn test_create_writes_metadata() {
    println!("=== TEST: create() opens both namespaces and writes metadata ===");
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "docs").await;

    assert_eq!(store.state(), LifecycleState::Ready);
    assert!(tmp.path().join("docs").exists());

    let neighbors = store
        .get_raw_bytes(CF_META, b"neighbors")
        .await
        .unwrap()
        .expect("neighbors written");
    let ef = store
        .get_raw_bytes(CF_META, b"efConstruction")
        .await
        .unwrap()
        .expect("efConstruction written");
    let name = store
        .get_raw_bytes(CF_META, b"collectionName")
        .await
        .unwrap()
        .expect("collectionName written");

    println!("AFTER: neighbors={:?} efConstruction={:?} name={:?}", neighbors, ef, name);
    assert_eq!(neighbors, 16u64.to_le_bytes().to_vec());
    assert_eq!(ef, 200u64.to_le_bytes().to_vec());
    assert_eq!(name, b"docs".to_vec());
}

#[tokio::test]
async fn test_create_same_config_twice_is_idempotent() {
    let tmp = TempDir::new().expect("create temp dir");
    drop(create_store(&tmp, "docs").await);
    let store = create_store(&tmp, "docs").await;
    assert_eq!(store.state(), LifecycleState::Ready);
}

#[tokio::test]
async fn test_m_mismatch_rejected_and_metadata_untouched() {
    println!("=== TEST: create(M=16) then create(M=8) -> ConfigMismatch ===");
    init_tracing();
    let tmp = TempDir::new().expect("create temp dir");

    let first: VectorStore =
        VectorStore::create(CollectionConfig::new("c").with_m(16), store_config(&tmp))
            .await
            .expect("first create");
    drop(first);

    let err = VectorStore::<vector_store_core::HnswGraph>::create(
        CollectionConfig::new("c").with_m(8),
        store_config(&tmp),
    )
    .await
    .unwrap_err();
    println!("AFTER: error = {}", err);

    match &err {
        StoreError::ConfigMismatch {
            collection,
            key,
            stored,
            requested,
        } => {
            assert_eq!(collection, "c");
            assert_eq!(*key, "neighbors");
            assert_eq!(stored, "16");
            assert_eq!(requested, "8");
        }
        other => panic!("Expected ConfigMismatch, got {:?}", other),
    }

    let reopened: VectorStore =
        VectorStore::open_existing("c", store_config(&tmp)).await.expect("reopen");
    assert_eq!(reopened.config().m, 16, "stored M was not rewritten");
}

#[tokio::test]
async fn test_ef_construction_mismatch_rejected() {
    init_tracing();
    let tmp = TempDir::new().expect("create temp dir");
    drop(create_store(&tmp, "c").await);

    let result = VectorStore::<vector_store_core::HnswGraph>::create(
        CollectionConfig::new("c").with_ef_construction(64),
        store_config(&tmp),
    )
    .await;
    assert!(matches!(
        result,
        Err(StoreError::ConfigMismatch {
            key: "efConstruction",
            ..
        })
    ));
}

#[tokio::test]
async fn test_open_existing_uses_stored_parameters() {
    init_tracing();
    let tmp = TempDir::new().expect("create temp dir");
    let config = CollectionConfig::new("tuned")
        .with_m(8)
        .with_ef_construction(64);
    let store: VectorStore = VectorStore::create(config.clone(), store_config(&tmp))
        .await
        .expect("create");
    insert_all(&store, &random_vectors(20, 4, 1));
    store.save_index().await.expect("save");
    drop(store);

    let reopened: VectorStore = VectorStore::open_existing("tuned", store_config(&tmp))
        .await
        .expect("open_existing");
    assert_eq!(reopened.config(), &config);
    assert!(reopened.is_empty(), "open does not load");
    assert_eq!(reopened.load_index().await.unwrap(), 20);
}

#[tokio::test]
async fn test_open_existing_missing_collection() {
    let tmp = TempDir::new().expect("create temp dir");
    let result = VectorStore::<vector_store_core::HnswGraph>::open_existing(
        "nothing-here",
        store_config(&tmp),
    )
    .await;
    assert!(matches!(result, Err(StoreError::IndexMissing { .. })));
    assert!(!tmp.path().join("nothing-here").exists());
}

// =========================================================================
// create_index
// =========================================================================

#[tokio::test]
async fn test_create_index_refuses_existing_records() {
    println!("=== TEST: create_index(false) with records -> AlreadyExists ===");
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "docs").await;

    assert_eq!(store.create_index(false).await.unwrap(), 0, "empty store");

    insert_all(&store, &random_vectors(7, 3, 2));
    store.save_index().await.unwrap();

    let err = store.create_index(false).await.unwrap_err();
    println!("AFTER: error = {}", err);
    assert!(matches!(err, StoreError::AlreadyExists { records: 7, .. }));
    assert_eq!(store.stored_record_count().await.unwrap(), 7);

    assert_eq!(store.create_index(true).await.unwrap(), 7);
    assert_eq!(store.stored_record_count().await.unwrap(), 0);
    assert!(matches!(
        store.load_index().await,
        Err(StoreError::IndexMissing { .. })
    ));
    assert_eq!(store.len(), 7, "in-memory graph untouched");
}

// =========================================================================
// Delete Finality
// =========================================================================

#[tokio::test]
async fn test_delete_is_final() {
    println!("=== TEST: delete_index -> every operation fails, no re-init ===");
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "docs").await;
    insert_all(&store, &random_vectors(10, 3, 3));
    store.save_index().await.unwrap();

    println!("BEFORE: dir exists = {}", tmp.path().join("docs").exists());
    store.delete_index().await.expect("delete failed");
    println!("AFTER: dir exists = {}", tmp.path().join("docs").exists());

    assert_eq!(store.state(), LifecycleState::Deleted);
    assert!(!tmp.path().join("docs").exists());
    assert!(store.is_empty());

    assert!(matches!(
        store.save_index().await,
        Err(StoreError::Deleted {
            operation: "save_index",
            ..
        })
    ));
    assert!(matches!(
        store.load_index().await,
        Err(StoreError::Deleted { .. })
    ));
    assert!(matches!(
        store.create_index(true).await,
        Err(StoreError::Deleted { .. })
    ));
    assert!(matches!(
        store.query(&[1.0, 0.0, 0.0], 3),
        Err(StoreError::Deleted { .. })
    ));
    assert!(matches!(
        store.insert(vec![1.0, 0.0, 0.0]),
        Err(StoreError::Deleted { .. })
    ));
    assert!(matches!(
        store.stored_record_count().await,
        Err(StoreError::Deleted { .. })
    ));

    assert!(!tmp.path().join("docs").exists(), "nothing re-created");
}

#[tokio::test]
async fn test_recreate_after_delete_starts_empty() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "docs").await;
    insert_all(&store, &random_vectors(5, 3, 4));
    store.save_index().await.unwrap();
    store.delete_index().await.unwrap();
    drop(store);

    let fresh = create_store(&tmp, "docs").await;
    assert_eq!(fresh.stored_record_count().await.unwrap(), 0);
    assert!(matches!(
        fresh.load_index().await,
        Err(StoreError::IndexMissing { .. })
    ));
}

#[tokio::test]
async fn test_destroy_collection_without_coordinator() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = create_store(&tmp, "docs").await;
    insert_all(&store, &random_vectors(5, 3, 5));
    store.save_index().await.unwrap();
    drop(store);

    destroy_collection("docs", &store_config(&tmp)).expect("destroy");
    assert!(!tmp.path().join("docs").exists());
}

#[tokio::test]
async fn test_collections_are_independent() {
    let tmp = TempDir::new().expect("create temp dir");
    let a = create_store(&tmp, "a").await;
    let b = create_store(&tmp, "b").await;

    insert_all(&a, &random_vectors(4, 2, 6));
    a.save_index().await.unwrap();
    b.delete_index().await.unwrap();

    assert_eq!(a.stored_record_count().await.unwrap(), 4);
    assert!(tmp.path().join("a").exists());
    assert!(!tmp.path().join("b").exists());
}
