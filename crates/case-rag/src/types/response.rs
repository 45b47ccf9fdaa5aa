//! Response types for uploads and answers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Chunk, Document};

/// Retrieved passage that was placed in the prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Page number the passage came from
    pub page_number: u32,
    /// Cosine similarity to the question (higher is closer)
    pub similarity: f32,
    /// Short excerpt of the passage
    pub snippet: String,
}

impl SourceRef {
    /// Maximum snippet length in bytes
    const SNIPPET_LEN: usize = 200;

    /// Build a source reference from a retrieved chunk
    pub fn from_chunk(chunk: &Chunk, similarity: f32) -> Self {
        Self {
            chunk_id: chunk.id,
            page_number: chunk.page_number,
            similarity,
            snippet: truncate_snippet(&chunk.content, Self::SNIPPET_LEN),
        }
    }
}

/// Generated answer plus the passages it was conditioned on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Model output, verbatim
    pub text: String,
    /// Retrieved passages in rank order
    pub sources: Vec<SourceRef>,
}

/// Response from POST /api/ask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Generated answer
    pub answer: String,
    /// Retrieved passages
    pub sources: Vec<SourceRef>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl AskResponse {
    /// Wrap an engine answer
    pub fn new(answer: Answer, processing_time_ms: u64) -> Self {
        Self {
            answer: answer.text,
            sources: answer.sources,
            processing_time_ms,
        }
    }
}

/// Summary of an uploaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document ID
    pub id: Uuid,
    /// Filename
    pub filename: String,
    /// Number of pages
    pub total_pages: Option<u32>,
    /// File size in bytes
    pub file_size: u64,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            total_pages: doc.total_pages,
            file_size: doc.file_size,
            uploaded_at: doc.uploaded_at,
        }
    }
}

/// Response from POST /api/upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Uploaded document
    pub document: DocumentSummary,
    /// Pages extracted
    pub pages: usize,
    /// Chunks embedded and stored
    pub chunks: usize,
    /// Collection holding the chunks
    pub collection: String,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Truncate a snippet at a word boundary
fn truncate_snippet(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }

    if let Some(pos) = text[..end].rfind(' ') {
        return format!("{}...", &text[..pos]);
    }

    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_snippet() {
        let snippet = "This is a very long snippet that needs to be truncated.";
        let truncated = truncate_snippet(snippet, 20);

        assert!(truncated.len() <= 23);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_source_ref_keeps_page() {
        let chunk = Chunk::new(Uuid::new_v4(), "Revenue grew 12% in Q3.".to_string(), 3, 0, 0, 23);
        let source = SourceRef::from_chunk(&chunk, 0.87);
        assert_eq!(source.page_number, 3);
        assert_eq!(source.snippet, "Revenue grew 12% in Q3.");
    }
}
