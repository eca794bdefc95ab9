//! RocksDB column family definitions for a vector collection.
//!
//! Each collection is one RocksDB directory holding two column families.
//!
//! # Column Families (2 total)
//! | Name | Purpose | Key Format | Value |
//! |------|---------|------------|-------|
//! | meta | Collection configuration | `"efConstruction"`, `"neighbors"`, `"collectionName"` | u64 LE / UTF-8 |
//! | index | One record per graph node | decimal node id | `NodeRecord` via bincode |
//!
//! Option builders are infallible. Misconfiguration surfaces when the
//! database is opened.

use rocksdb::{BlockBasedOptions, Cache, ColumnFamilyDescriptor, Options};

/// Collection configuration scalars.
/// Key: metadata key name (UTF-8)
/// Value: u64 little-endian, or UTF-8 for `collectionName`
pub const CF_META: &str = "meta";

/// Serialized graph nodes.
/// Key: node id as a decimal string
/// Value: `NodeRecord` serialized via bincode
pub const CF_INDEX: &str = "index";

/// All vector store column family names.
pub const VECTOR_STORE_CFS: &[&str] = &[CF_META, CF_INDEX];

/// Total count of vector store CFs.
pub const VECTOR_STORE_CF_COUNT: usize = 2;

/// Options for the metadata CF (three tiny values, point lookups only).
///
/// # Configuration
/// - No compression
/// - Bloom filter for fast lookups
/// - Optimized for point lookups
pub fn meta_cf_options(cache: &Cache) -> Options {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);
    block_opts.set_bloom_filter(10.0, false);
    block_opts.set_cache_index_and_filter_blocks(true);

    let mut opts = Options::default();
    opts.set_block_based_table_factory(&block_opts);
    opts.set_compression_type(rocksdb::DBCompressionType::None);
    opts.optimize_for_point_lookup(16); // 16MB hint for point lookups
    opts.create_if_missing(true);
    opts
}

/// Options for the node CF.
///
/// Loads scan the whole CF and saves rewrite most of it, so records are
/// LZ4-compressed and larger blocks favor sequential reads.
pub fn index_cf_options(cache: &Cache) -> Options {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);
    block_opts.set_block_size(16 * 1024);
    block_opts.set_cache_index_and_filter_blocks(true);

    let mut opts = Options::default();
    opts.set_block_based_table_factory(&block_opts);
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
    opts.create_if_missing(true);
    opts
}

/// Get all vector store column family descriptors.
///
/// # Arguments
/// * `cache` - Shared block cache
///
/// # Returns
/// Vector of 2 `ColumnFamilyDescriptor`s
pub fn get_vector_store_cf_descriptors(cache: &Cache) -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_META, meta_cf_options(cache)),
        ColumnFamilyDescriptor::new(CF_INDEX, index_cf_options(cache)),
    ]
}
