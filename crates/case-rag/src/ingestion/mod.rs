//! Document ingestion: upload storage, PDF loading and chunking

mod chunker;
mod loader;
mod upload;

pub use chunker::TextChunker;
pub use loader::{cleanup_pdf_text, PdfLoader};
pub use upload::{sanitize_filename, UploadStore};
