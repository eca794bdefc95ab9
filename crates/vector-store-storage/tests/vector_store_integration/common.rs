//! Shared helpers for vector store integration tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use vector_store_core::distance::euclidean;
use vector_store_core::CollectionConfig;
use vector_store_storage::{SaveMode, StoreConfig, VectorStore};

/// Install a test-friendly subscriber once. Respects `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Deterministic vectors in `[-1, 1)`.
pub fn random_vectors(count: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

/// Store config rooted in `tmp`.
pub fn store_config(tmp: &TempDir) -> StoreConfig {
    StoreConfig::with_data_dir(tmp.path())
}

/// Store config rooted in `tmp` using per-record saves.
pub fn per_record_config(tmp: &TempDir, write_concurrency: usize) -> StoreConfig {
    StoreConfig {
        save_mode: SaveMode::PerRecord,
        write_concurrency,
        ..store_config(tmp)
    }
}

/// `create()` a default-parameter collection.
pub async fn create_store(tmp: &TempDir, name: &str) -> VectorStore {
    init_tracing();
    VectorStore::create(CollectionConfig::new(name), store_config(tmp))
        .await
        .expect("create failed")
}

/// Insert every vector and return the assigned ids.
pub fn insert_all(store: &VectorStore, vectors: &[Vec<f32>]) -> Vec<u64> {
    vectors
        .iter()
        .map(|v| store.insert(v.clone()).expect("insert failed"))
        .collect()
}

/// The `k` smallest exact distances from `target` to `vectors`.
pub fn brute_force_distances(vectors: &[Vec<f32>], target: &[f32], k: usize) -> Vec<f32> {
    let mut distances: Vec<f32> = vectors.iter().map(|v| euclidean(target, v)).collect();
    distances.sort_by(|a, b| a.total_cmp(b));
    distances.truncate(k);
    distances
}
