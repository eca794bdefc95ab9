//! `IndexPersistence` implementation for `VectorStore`.
//!
//! Delegates to the inherent implementations in `persistence.rs`.

use async_trait::async_trait;
use vector_store_core::GraphEngine;

use super::VectorStore;
use crate::error::StoreResult;
use crate::traits::IndexPersistence;

#[async_trait]
impl<G: GraphEngine + 'static> IndexPersistence for VectorStore<G> {
    async fn create_index(&self, overwrite: bool) -> StoreResult<usize> {
        self.create_index_async(overwrite).await
    }

    async fn load_index(&self) -> StoreResult<usize> {
        self.load_index_async().await
    }

    async fn save_index(&self) -> StoreResult<usize> {
        self.save_index_async().await
    }

    async fn delete_index(&self) -> StoreResult<()> {
        self.delete_index_async().await
    }
}
