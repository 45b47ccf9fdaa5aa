//! Local vector store provider backed by the on-disk collection store

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::VectorStoreConfig;
use crate::error::{Error, Result};
use crate::retrieval::FileVectorStore;
use crate::types::Chunk;

use super::vector_store::{CollectionInfo, VectorSearchResult, VectorStoreProvider};

/// Local vector store wrapping [`FileVectorStore`]
///
/// Store operations touch the filesystem, so they run on the blocking pool.
pub struct LocalVectorStore {
    store: Arc<FileVectorStore>,
}

impl LocalVectorStore {
    /// Create from an existing store
    pub fn new(store: Arc<FileVectorStore>) -> Self {
        Self { store }
    }

    /// Create from config
    pub fn from_config(config: &VectorStoreConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(FileVectorStore::from_config(config)?)))
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&FileVectorStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn replace_collection(
        &self,
        collection: &str,
        embed_model: &str,
        chunks: &[Chunk],
    ) -> Result<usize> {
        let collection = collection.to_string();
        let embed_model = embed_model.to_string();
        let chunks = chunks.to_vec();
        self.blocking(move |store| store.replace_collection(&collection, &embed_model, &chunks))
            .await
    }

    async fn search(
        &self,
        collection: &str,
        embed_model: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        let collection = collection.to_string();
        let embed_model = embed_model.to_string();
        let query = query_embedding.to_vec();

        let hits = self
            .blocking(move |store| store.search(&collection, &embed_model, &query, top_k))
            .await?;

        Ok(hits
            .into_iter()
            .map(|hit| VectorSearchResult {
                chunk: hit.chunk,
                similarity: hit.similarity,
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collection = collection.to_string();
        self.blocking(move |store| store.count(&collection)).await
    }

    async fn delete_collection(&self, collection: &str) -> Result<bool> {
        let collection = collection.to_string();
        self.blocking(move |store| store.delete_collection(&collection))
            .await
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        self.blocking(|store| store.list_collections()).await
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.store.dir().is_dir())
    }

    fn name(&self) -> &'static str {
        "local-flat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_round_trip_through_blocking_pool() {
        let dir = TempDir::new().unwrap();
        let config = VectorStoreConfig {
            store_dir: dir.path().join("chroma_db"),
            lock_timeout_secs: 1,
        };
        let store = LocalVectorStore::from_config(&config).unwrap();
        assert!(store.health_check().await.unwrap());

        let mut chunk = Chunk::new(Uuid::new_v4(), "Revenue grew 12%".to_string(), 1, 0, 0, 16);
        chunk.embedding = vec![0.6, 0.8];
        assert_eq!(store.replace_collection("case", "m", &[chunk]).await.unwrap(), 1);

        let results = store.search("case", "m", &[0.6, 0.8], 4).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].similarity - 1.0).abs() < 1e-5);
        assert_eq!(store.count("case").await.unwrap(), 1);
        assert_eq!(store.list_collections().await.unwrap().len(), 1);
        assert!(store.delete_collection("case").await.unwrap());
    }
}
