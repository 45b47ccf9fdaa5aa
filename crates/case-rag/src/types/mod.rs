//! Core types for the case Q&A system

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, IndexHandle, PageRecord};
pub use query::AskRequest;
pub use response::{Answer, AskResponse, DocumentSummary, SourceRef, UploadResponse};
