//! Collection configuration.
//!
//! `CollectionConfig` is the typed form of the three scalars persisted in a
//! collection's metadata namespace. Once a collection exists these values are
//! immutable: the storage layer compares a requested config against the
//! stored one and refuses to proceed on any disagreement.

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

/// Default maximum neighbors per layer.
pub const DEFAULT_M: usize = 16;

/// Default candidate list size used while building the graph.
pub const DEFAULT_EF_CONSTRUCTION: usize = 200;

/// Default candidate list size used while querying.
pub const DEFAULT_EF_SEARCH: usize = 50;

/// Identity and construction parameters of a vector collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Unique collection name. Also names the on-disk directory.
    pub collection_name: String,
    /// Maximum neighbors per layer (`2 * m` at layer 0).
    pub m: usize,
    /// Candidate list size used during construction.
    pub ef_construction: usize,
}

impl CollectionConfig {
    /// Config with default `m` and `ef_construction`.
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            m: DEFAULT_M,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
        }
    }

    /// Set `m`.
    #[must_use]
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    /// Set `ef_construction`.
    #[must_use]
    pub fn with_ef_construction(mut self, ef_construction: usize) -> Self {
        self.ef_construction = ef_construction;
        self
    }

    /// Validate the configuration.
    ///
    /// The collection name is used as a directory name, so it must be a single
    /// non-empty path component.
    ///
    /// # Errors
    ///
    /// `GraphError::InvalidConfig` describing the first invalid field.
    pub fn validate(&self) -> GraphResult<()> {
        let name = self.collection_name.as_str();
        if name.trim().is_empty() {
            return Err(GraphError::InvalidConfig(
                "collection_name must not be empty".to_string(),
            ));
        }
        if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
            return Err(GraphError::InvalidConfig(format!(
                "collection_name '{}' must be a single path component",
                name
            )));
        }
        if self.m < 2 {
            return Err(GraphError::InvalidConfig(format!(
                "m must be at least 2, got {}",
                self.m
            )));
        }
        if self.ef_construction == 0 {
            return Err(GraphError::InvalidConfig(
                "ef_construction must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
