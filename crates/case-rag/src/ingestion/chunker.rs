//! Text chunking with page tracking
//!
//! Chunks are built from whole sentences inside a single page and never span
//! two pages. A page shorter than the target size becomes exactly one chunk.

use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, PageRecord};

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in bytes
    chunk_size: usize,
    /// Overlap carried into the next chunk
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap: overlap.min(chunk_size.saturating_sub(1)),
            min_size: 20,
        }
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        let mut chunker = Self::new(config.chunk_size, config.chunk_overlap);
        chunker.min_size = config.min_chunk_size;
        chunker
    }

    /// Chunk every page of a document, numbering chunks in document order
    pub fn chunk_pages(&self, document_id: Uuid, pages: &[PageRecord]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages.iter().filter(|p| p.has_text()) {
            for (start, end) in self.split_page(&page.text) {
                chunks.push(Chunk::new(
                    document_id,
                    page.text[start..end].trim().to_string(),
                    page.page_number,
                    chunks.len() as u32,
                    start,
                    end,
                ));
            }
        }

        chunks
    }

    /// Split one page into byte ranges
    fn split_page(&self, text: &str) -> Vec<(usize, usize)> {
        let pieces = self.pieces(text);
        let Some(&(first, _)) = pieces.first() else {
            return Vec::new();
        };

        let mut spans = Vec::new();
        let mut start = first;
        let mut end = first;

        for (offset, piece) in pieces {
            let piece_end = offset + piece.len();

            if end > start && piece_end - start > self.chunk_size {
                spans.push((start, end));
                start = self.overlap_start(text, start, end);
            }

            end = piece_end;
        }

        if end > start {
            spans.push((start, end));
        }

        if spans.len() > 1 {
            spans.retain(|&(s, e)| text[s..e].trim().len() >= self.min_size);
        }

        spans
    }

    /// Sentence pieces, with sentences longer than a chunk split at word bounds
    fn pieces<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        let mut pieces = Vec::new();

        for (offset, sentence) in text.split_sentence_bound_indices() {
            if sentence.len() <= self.chunk_size {
                pieces.push((offset, sentence));
                continue;
            }

            let mut run_start = 0usize;
            let mut run_end = 0usize;
            for (word_offset, word) in sentence.split_word_bound_indices() {
                let word_end = word_offset + word.len();
                if run_end > run_start && word_end - run_start > self.chunk_size {
                    pieces.push((offset + run_start, &sentence[run_start..run_end]));
                    run_start = run_end;
                }
                run_end = word_end;
            }
            if run_end > run_start {
                pieces.push((offset + run_start, &sentence[run_start..run_end]));
            }
        }

        pieces
    }

    /// Where the next chunk starts so that it repeats the tail of the last one
    fn overlap_start(&self, text: &str, start: usize, end: usize) -> usize {
        if self.overlap == 0 {
            return end;
        }

        let mut candidate = end.saturating_sub(self.overlap);
        while candidate < end && !text.is_char_boundary(candidate) {
            candidate += 1;
        }

        // Start on a word boundary
        if let Some(pos) = text[candidate..end].find(char::is_whitespace) {
            candidate += pos;
            while candidate < end && text[candidate..].starts_with(char::is_whitespace) {
                candidate += text[candidate..].chars().next().map_or(1, char::len_utf8);
            }
        }

        if candidate <= start || candidate >= end {
            end
        } else {
            candidate
        }
    }
}
