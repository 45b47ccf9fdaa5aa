//! case-rag: question answering over uploaded business case PDFs
//!
//! A PDF is loaded page by page, split into overlapping chunks, embedded with
//! a local Ollama model and stored in its own on-disk collection. Questions
//! retrieve the closest chunks and a hosted Gemini model answers from them
//! alone, in an MBA case debrief style.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use engine::{CaseEngine, IngestReport};
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, Document, IndexHandle, PageRecord},
    query::AskRequest,
    response::{Answer, AskResponse, SourceRef},
};
