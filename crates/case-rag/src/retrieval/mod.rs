//! Retrieval module: per-document vector collections on disk

pub mod lock;
mod store;

pub use lock::WriterLock;
pub use store::{cosine_similarity, FileVectorStore, SearchHit};
