//! Document, page and chunk types with page tracking for source references

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Hex characters of the content hash kept in collection names
const COLLECTION_HASH_LEN: usize = 12;

/// Longest filename stem kept in collection names
const COLLECTION_STEM_LEN: usize = 100;

/// An uploaded PDF case study
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Sanitized filename as stored in the upload directory
    pub filename: String,
    /// Location of the stored PDF
    pub path: PathBuf,
    /// SHA-256 of the PDF bytes (hex)
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Total number of pages, known after loading
    pub total_pages: Option<u32>,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Describe a PDF from its stored location and raw bytes
    pub fn new(filename: impl Into<String>, path: impl Into<PathBuf>, data: &[u8]) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            path: path.into(),
            content_hash: hash_bytes(data),
            file_size: data.len() as u64,
            total_pages: None,
            uploaded_at: chrono::Utc::now(),
        }
    }

    /// Read a PDF that already sits on disk
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            crate::Error::load(path.display().to_string(), format!("Cannot read file: {}", e))
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());
        Ok(Self::new(filename, path, &data))
    }

    /// Name of the vector store collection owned by this document.
    ///
    /// Same bytes always map to the same collection, so re-uploading a file
    /// replaces its index instead of duplicating it.
    pub fn collection_name(&self) -> String {
        let stem = Path::new(&self.filename)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let stem: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .take(COLLECTION_STEM_LEN)
            .collect();
        let stem = stem.trim_matches('-');
        let stem = if stem.is_empty() { "document" } else { stem };
        let hash_len = COLLECTION_HASH_LEN.min(self.content_hash.len());
        format!("{}-{}", stem, &self.content_hash[..hash_len])
    }
}

/// Text extracted from one PDF page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageRecord {
    /// Page number (1-indexed, document order)
    pub page_number: u32,
    /// Extracted text (may be empty for image-only pages)
    pub text: String,
    /// PDF the page came from
    pub source: PathBuf,
}

impl PageRecord {
    /// Whether the page produced any text
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A span of page text and its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Text content
    pub content: String,
    /// Page the text came from
    pub page_number: u32,
    /// Chunk index within the document
    pub chunk_index: u32,
    /// Byte offset where the chunk starts within the page text
    pub char_start: usize,
    /// Byte offset one past the end of the chunk within the page text
    pub char_end: usize,
    /// Embedding vector
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a chunk without an embedding
    pub fn new(
        document_id: Uuid,
        content: String,
        page_number: u32,
        chunk_index: u32,
        char_start: usize,
        char_end: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            page_number,
            chunk_index,
            char_start,
            char_end,
            embedding: Vec::new(),
        }
    }
}

/// Handle to a built index, required for answering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexHandle {
    /// Collection inside the store directory
    pub collection: String,
    /// Document the collection was built from
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Number of stored chunks
    pub chunk_count: usize,
    /// Embedding model used at build time
    pub embed_model: String,
}

/// SHA-256 of raw bytes as lowercase hex
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
