//! Provider abstractions for embeddings, answer generation and vector storage
//!
//! The engine only talks to these traits, so tests can swap in fakes for the
//! Ollama, Gemini and on-disk backends.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod retry;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiClient;
pub use llm::LlmProvider;
pub use local::LocalVectorStore;
pub use ollama::OllamaEmbedder;
pub use retry::RetryPolicy;
pub use vector_store::{CollectionInfo, VectorSearchResult, VectorStoreProvider};
