//! Persistent vector store with one file per collection

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

use crate::config::VectorStoreConfig;
use crate::error::{Error, Result};
use crate::providers::vector_store::CollectionInfo;
use crate::types::Chunk;

use super::lock::WriterLock;

/// Collection file extension
const COLLECTION_EXT: &str = "json";

/// Longest accepted collection name
const MAX_COLLECTION_NAME: usize = 128;

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity
    pub similarity: f32,
}

/// On-disk layout of one collection
#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    name: String,
    embed_model: String,
    dimensions: usize,
    updated_at: chrono::DateTime<chrono::Utc>,
    chunks: Vec<Chunk>,
}

/// Flat cosine-similarity store persisted under a directory.
///
/// Each collection lives in `<dir>/<name>.json`. Writes are staged in a temp
/// file in the same directory and renamed into place, so a crashed or failed
/// build never leaves a half-written collection behind. Writers hold a
/// [`WriterLock`] for the whole write.
pub struct FileVectorStore {
    dir: PathBuf,
    lock_timeout: Duration,
    /// Serializes writers within this process before touching the lock file
    writers: Mutex<()>,
}

impl FileVectorStore {
    /// Open (and create) a store directory
    pub fn open(dir: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::storage(format!("Cannot create store {}: {}", dir.display(), e)))?;

        Ok(Self {
            dir,
            lock_timeout,
            writers: Mutex::new(()),
        })
    }

    /// Open the store described by configuration
    pub fn from_config(config: &VectorStoreConfig) -> Result<Self> {
        Self::open(
            config.store_dir.clone(),
            Duration::from_secs(config.lock_timeout_secs),
        )
    }

    /// Store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replace a collection with the given embedded chunks
    pub fn replace_collection(&self, name: &str, embed_model: &str, chunks: &[Chunk]) -> Result<usize> {
        let path = self.collection_path(name)?;

        let dimensions = chunks
            .first()
            .map(|c| c.embedding.len())
            .ok_or_else(|| Error::storage(format!("Refusing to write empty collection {}", name)))?;
        if dimensions == 0 {
            return Err(Error::storage("Chunk has no embedding"));
        }
        if let Some(bad) = chunks
            .iter()
            .find(|c| c.embedding.len() != dimensions || c.embedding.iter().any(|v| !v.is_finite()))
        {
            return Err(Error::storage(format!(
                "Chunk {} has an inconsistent or non-finite embedding",
                bad.id
            )));
        }

        let file = CollectionFile {
            name: name.to_string(),
            embed_model: embed_model.to_string(),
            dimensions,
            updated_at: chrono::Utc::now(),
            chunks: chunks.to_vec(),
        };

        let _guard = self.writers.lock();
        let _lock = WriterLock::acquire(&self.dir, self.lock_timeout)?;

        let staged = NamedTempFile::new_in(&self.dir)
            .map_err(|e| Error::storage(format!("Cannot stage collection {}: {}", name, e)))?;
        {
            let mut writer = BufWriter::new(staged.as_file());
            serde_json::to_writer(&mut writer, &file)?;
            writer
                .flush()
                .map_err(|e| Error::storage(format!("Cannot write collection {}: {}", name, e)))?;
        }
        staged
            .as_file()
            .sync_all()
            .map_err(|e| Error::storage(format!("Cannot sync collection {}: {}", name, e)))?;
        staged
            .persist(&path)
            .map_err(|e| Error::storage(format!("Cannot commit collection {}: {}", name, e.error)))?;

        tracing::info!(
            "Committed collection {} ({} chunks, {} dims, model {})",
            name,
            chunks.len(),
            dimensions,
            embed_model
        );

        Ok(chunks.len())
    }

    /// Search a collection by cosine similarity
    pub fn search(
        &self,
        name: &str,
        embed_model: &str,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let file = self
            .read_collection(name)?
            .ok_or_else(|| Error::NotIndexed(format!("Collection {} has not been built", name)))?;

        if file.chunks.is_empty() {
            return Err(Error::NotIndexed(format!("Collection {} is empty", name)));
        }
        if file.embed_model != embed_model {
            return Err(Error::embedding(format!(
                "Collection {} was built with {} but queried with {}",
                name, file.embed_model, embed_model
            )));
        }
        if query_embedding.len() != file.dimensions {
            return Err(Error::embedding(format!(
                "Query embedding has {} dimensions, collection {} has {}",
                query_embedding.len(),
                name,
                file.dimensions
            )));
        }

        let mut hits: Vec<SearchHit> = file
            .chunks
            .into_iter()
            .map(|chunk| {
                let similarity = cosine_similarity(query_embedding, &chunk.embedding);
                SearchHit { chunk, similarity }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
        });
        hits.truncate(top_k);

        Ok(hits)
    }

    /// Number of chunks in a collection (0 when absent)
    pub fn count(&self, name: &str) -> Result<usize> {
        Ok(self.read_collection(name)?.map_or(0, |f| f.chunks.len()))
    }

    /// Delete a collection, returning whether it existed
    pub fn delete_collection(&self, name: &str) -> Result<bool> {
        let path = self.collection_path(name)?;

        let _guard = self.writers.lock();
        let _lock = WriterLock::acquire(&self.dir, self.lock_timeout)?;

        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("Deleted collection {}", name);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(format!("Cannot delete collection {}: {}", name, e))),
        }
    }

    /// List all collections in the store
    pub fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| Error::storage(format!("Cannot list store {}: {}", self.dir.display(), e)))?;

        let mut collections = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != COLLECTION_EXT) {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            match self.read_collection(&name) {
                Ok(Some(file)) => collections.push(CollectionInfo {
                    name: file.name,
                    embed_model: file.embed_model,
                    dimensions: file.dimensions,
                    count: file.chunks.len(),
                    updated_at: file.updated_at,
                }),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping unreadable collection {}: {}", path.display(), e),
            }
        }

        collections.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(collections)
    }

    fn read_collection(&self, name: &str) -> Result<Option<CollectionFile>> {
        let path = self.collection_path(name)?;
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::storage(format!("Cannot read collection {}: {}", name, e)));
            }
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| Error::storage(format!("Collection {} is corrupt: {}", name, e)))
    }

    fn collection_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name.len() <= MAX_COLLECTION_NAME
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(Error::storage(format!("Invalid collection name: {:?}", name)));
        }
        Ok(self.dir.join(format!("{}.{}", name, COLLECTION_EXT)))
    }
}

/// Cosine similarity; zero vectors are dissimilar to everything
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
