//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Chunk;

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct VectorSearchResult {
    /// The matched chunk
    pub chunk: Chunk,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

/// Summary of one stored collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name
    pub name: String,
    /// Embedding model the vectors came from
    pub embed_model: String,
    /// Vector dimensions
    pub dimensions: usize,
    /// Number of stored chunks
    pub count: usize,
    /// When the collection was last written
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for vector storage and similarity search over named collections
///
/// Implementations:
/// - `LocalVectorStore`: flat cosine index persisted to the store directory
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Atomically replace a collection with the given embedded chunks.
    ///
    /// Returns the number of chunks written. Other collections are untouched.
    async fn replace_collection(
        &self,
        collection: &str,
        embed_model: &str,
        chunks: &[Chunk],
    ) -> Result<usize>;

    /// Search a collection for the chunks nearest to the query embedding
    async fn search(
        &self,
        collection: &str,
        embed_model: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>>;

    /// Number of chunks in a collection (0 when it does not exist)
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Remove a collection, returning whether it existed
    async fn delete_collection(&self, collection: &str) -> Result<bool>;

    /// List stored collections
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>>;

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
