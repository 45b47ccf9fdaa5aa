//! Configuration for the case Q&A system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable pointing at an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "CASE_RAG_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Upload directory configuration
    pub upload: UploadConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Vector store configuration
    pub vector_store: VectorStoreConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Answer generation configuration
    pub generation: GenerationConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file, or defaults when no path is given.
    ///
    /// Falls back to `CASE_RAG_CONFIG` when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from),
        };

        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
                })?;
                let config: RagConfig = toml::from_str(&raw).map_err(|e| {
                    Error::Config(format!("Invalid config file {}: {}", path.display(), e))
                })?;
                tracing::info!("Loaded configuration from {}", path.display());
                config
            }
            None => RagConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the pipeline misbehave
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(
                "chunking.chunk_overlap must be smaller than chunking.chunk_size".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::Config(
                "generation.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Where uploaded PDFs are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Upload directory
    pub upload_dir: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("CaseUploads"),
        }
    }
}

/// Embedding (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name (all-minilm is all-MiniLM-L6-v2)
    pub model: String,
    /// Embedding dimensions
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for transient failures
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in bytes
    pub chunk_size: usize,
    /// Overlap between chunks in bytes
    pub chunk_overlap: usize,
    /// Minimum chunk size (smaller trailing fragments are dropped)
    pub min_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 20,
        }
    }
}

/// On-disk vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// Store directory holding one file per collection
    pub store_dir: PathBuf,
    /// How long a build waits for the writer lock
    pub lock_timeout_secs: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("chroma_db"),
            lock_timeout_secs: 10,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks placed in the prompt context
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Gemini generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Generative Language API base URL
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature (low for factual answers)
    pub temperature: f32,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for transient failures
    pub max_retries: u32,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.3,
            max_output_tokens: 2048,
            timeout_secs: 60,
            max_retries: 2,
            api_key_env: "GOOGLE_API_KEY".to_string(),
        }
    }
}

impl GenerationConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// Called once at startup so a missing credential fails before any
    /// upload is accepted.
    pub fn resolve_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            Ok(_) => Err(Error::Config(format!("{} is set but empty", self.api_key_env))),
            Err(_) => Err(Error::Config(format!(
                "{} is not set; export it or add it to .env",
                self.api_key_env
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let config = RagConfig::default();
        assert_eq!(config.upload.upload_dir, PathBuf::from("CaseUploads"));
        assert_eq!(config.vector_store.store_dir, PathBuf::from("chroma_db"));
        assert_eq!(config.generation.model, "gemini-2.0-flash");
        assert!((config.generation.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.retrieval.top_k, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval]\ntop_k = 6\n\n[vector_store]\nstore_dir = \"/tmp/idx\"").unwrap();

        let config = RagConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.vector_store.store_dir, PathBuf::from("/tmp/idx"));
        assert_eq!(config.vector_store.lock_timeout_secs, 10);
        assert_eq!(config.embeddings.model, "all-minilm");
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let config = GenerationConfig {
            api_key_env: "CASE_RAG_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..GenerationConfig::default()
        };
        let err = config.resolve_api_key().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("CASE_RAG_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
