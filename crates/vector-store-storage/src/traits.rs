//! Async persistence contract for a vector collection.

use async_trait::async_trait;

use crate::error::StoreResult;

/// Durable lifecycle operations of a vector collection.
///
/// Implementations serialize these calls against each other. Queries and
/// inserts are not part of this trait and never wait on it.
#[async_trait]
pub trait IndexPersistence: Send + Sync {
    /// Reset the durable representation to an empty index with current
    /// metadata.
    ///
    /// Returns the number of node records removed.
    ///
    /// # Errors
    /// `StoreError::AlreadyExists` if records exist and `overwrite` is false.
    async fn create_index(&self, overwrite: bool) -> StoreResult<usize>;

    /// Replace the in-memory node table with the stored one.
    ///
    /// Returns the number of nodes loaded. On any error the in-memory table
    /// is left exactly as it was.
    ///
    /// # Errors
    /// - `StoreError::IndexMissing` if no records are stored
    /// - `StoreError::IndexCorrupt` if any record or metadata entry is invalid
    async fn load_index(&self) -> StoreResult<usize>;

    /// Write every in-memory node and remove stored records for ids no
    /// longer present.
    ///
    /// Resolves only after every write has been acknowledged. Returns the
    /// number of records written.
    async fn save_index(&self) -> StoreResult<usize>;

    /// Remove both durable namespaces. Terminal for this instance.
    ///
    /// # Errors
    /// `StoreError::PurgeFailed` if the directory cannot be removed.
    async fn delete_index(&self) -> StoreResult<()>;
}
