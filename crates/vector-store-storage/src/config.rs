//! Store configuration.
//!
//! `StoreConfig` controls where collections live on disk, how RocksDB is
//! tuned, and how `save_index` writes records. Collection identity and
//! construction parameters are a separate concern (`CollectionConfig`) because
//! they are persisted and immutable, while everything here may change between
//! runs.
//!
//! # Loading Configuration
//!
//! ```rust,ignore
//! use vector_store_storage::StoreConfig;
//!
//! let config = StoreConfig::from_file("vector_store.toml")?
//!     .with_env_overrides();
//! config.validate()?;
//! ```
//!
//! # TOML Structure
//!
//! ```toml
//! data_dir = "/var/lib/vector_store"
//! block_cache_size = 67108864
//! max_open_files = 512
//! enable_wal = true
//! create_if_missing = true
//! save_mode = "atomic"        # or "per_record"
//! write_concurrency = 8
//! ef_search = 50
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vector_store_core::DEFAULT_EF_SEARCH;

use crate::error::{StoreError, StoreResult};

/// How `save_index` writes node records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Every record, and the removal of stale records, lands in one
    /// `WriteBatch`. A crash leaves either the previous or the new index.
    #[default]
    Atomic,
    /// Each record is its own write, dispatched across
    /// `write_concurrency` blocking tasks and joined before the save resolves.
    /// A crash may leave some records new and the rest stale.
    PerRecord,
}

impl SaveMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "atomic" => Some(Self::Atomic),
            "per_record" | "per-record" => Some(Self::PerRecord),
            _ => None,
        }
    }
}

/// Configuration for the vector store backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory; each collection is a RocksDB directory beneath it.
    pub data_dir: PathBuf,
    /// Block cache size in bytes (default: 64MB).
    pub block_cache_size: usize,
    /// Maximum number of open files (default: 512).
    pub max_open_files: i32,
    /// Enable WAL (write-ahead log) for durability (default: true).
    pub enable_wal: bool,
    /// Create collection directories that don't exist (default: true).
    pub create_if_missing: bool,
    /// Record write strategy for `save_index` (default: atomic).
    pub save_mode: SaveMode,
    /// Blocking tasks used by `SaveMode::PerRecord` (default: 8).
    pub write_concurrency: usize,
    /// Candidate list size handed to the graph engine for queries (default: 50).
    pub ef_search: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./vector_store_data"),
            block_cache_size: 64 * 1024 * 1024, // 64MB
            max_open_files: 512,
            enable_wal: true,
            create_if_missing: true,
            save_mode: SaveMode::Atomic,
            write_concurrency: 8,
            ef_search: DEFAULT_EF_SEARCH,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// - `StoreError::InvalidConfig` if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path).map_err(|e| StoreError::InvalidConfig {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        toml::from_str(&contents).map_err(|e| StoreError::InvalidConfig {
            message: format!("Failed to parse TOML in '{}': {}", path.display(), e),
        })
    }

    /// Create configuration from a TOML string.
    ///
    /// # Errors
    /// - `StoreError::InvalidConfig` if TOML parsing fails
    pub fn from_toml_str(toml: &str) -> StoreResult<Self> {
        toml::from_str(toml).map_err(|e| StoreError::InvalidConfig {
            message: format!("Failed to parse TOML: {}", e),
        })
    }

    /// Serialize configuration to a TOML string.
    ///
    /// # Errors
    /// - `StoreError::InvalidConfig` if serialization fails
    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| StoreError::InvalidConfig {
            message: format!("Failed to serialize to TOML: {}", e),
        })
    }

    /// Apply environment variable overrides. Prefix: `VECTOR_STORE_`
    ///
    /// Unparseable values are ignored.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `VECTOR_STORE_DATA_DIR` | `data_dir` |
    /// | `VECTOR_STORE_BLOCK_CACHE_SIZE` | `block_cache_size` |
    /// | `VECTOR_STORE_MAX_OPEN_FILES` | `max_open_files` |
    /// | `VECTOR_STORE_ENABLE_WAL` | `enable_wal` |
    /// | `VECTOR_STORE_SAVE_MODE` | `save_mode` |
    /// | `VECTOR_STORE_WRITE_CONCURRENCY` | `write_concurrency` |
    /// | `VECTOR_STORE_EF_SEARCH` | `ef_search` |
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = env::var("VECTOR_STORE_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("VECTOR_STORE_BLOCK_CACHE_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                self.block_cache_size = n;
            }
        }
        if let Ok(val) = env::var("VECTOR_STORE_MAX_OPEN_FILES") {
            if let Ok(n) = val.parse::<i32>() {
                self.max_open_files = n;
            }
        }
        if let Ok(val) = env::var("VECTOR_STORE_ENABLE_WAL") {
            if let Ok(b) = val.parse::<bool>() {
                self.enable_wal = b;
            }
        }
        if let Ok(val) = env::var("VECTOR_STORE_SAVE_MODE") {
            if let Some(mode) = SaveMode::parse(&val) {
                self.save_mode = mode;
            }
        }
        if let Ok(val) = env::var("VECTOR_STORE_WRITE_CONCURRENCY") {
            if let Ok(n) = val.parse::<usize>() {
                self.write_concurrency = n;
            }
        }
        if let Ok(val) = env::var("VECTOR_STORE_EF_SEARCH") {
            if let Ok(n) = val.parse::<usize>() {
                self.ef_search = n;
            }
        }
        self
    }

    /// Validate all configuration values.
    ///
    /// # Errors
    /// - `StoreError::InvalidConfig` describing the first invalid field
    pub fn validate(&self) -> StoreResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(StoreError::InvalidConfig {
                message: "data_dir must not be empty".to_string(),
            });
        }
        if self.block_cache_size == 0 {
            return Err(StoreError::InvalidConfig {
                message: "block_cache_size must be greater than 0".to_string(),
            });
        }
        if self.max_open_files == 0 || self.max_open_files < -1 {
            return Err(StoreError::InvalidConfig {
                message: format!(
                    "max_open_files must be positive or -1 (unlimited), got {}",
                    self.max_open_files
                ),
            });
        }
        if self.write_concurrency == 0 {
            return Err(StoreError::InvalidConfig {
                message: "write_concurrency must be at least 1".to_string(),
            });
        }
        if self.ef_search == 0 {
            return Err(StoreError::InvalidConfig {
                message: "ef_search must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Directory holding `collection_name`'s namespaces.
    pub fn collection_path(&self, collection_name: &str) -> PathBuf {
        self.data_dir.join(collection_name)
    }
}
