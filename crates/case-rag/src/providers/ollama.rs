//! Ollama embedding provider
//!
//! Talks to a local Ollama server. The default model, `all-minilm`, is the
//! Ollama build of sentence-transformers/all-MiniLM-L6-v2.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::retry::RetryPolicy;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Ollama embedding provider with timeout and bounded retry
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            timeout_secs: config.timeout_secs,
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &self.model, &body));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        if parsed.embedding.is_empty() {
            return Err(Error::embedding(format!(
                "Ollama returned an empty embedding for model {}",
                self.model
            )));
        }
        if parsed.embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "Model {} returned {} dimensions, expected {}",
                self.model,
                parsed.embedding.len(),
                self.dimensions
            )));
        }

        Ok(parsed.embedding)
    }

    fn send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout("Ollama embedding request", self.timeout_secs)
        } else if e.is_connect() {
            Error::embedding_transient(format!("Ollama unreachable at {}: {}", self.base_url, e))
        } else {
            Error::embedding_transient(format!("Embedding request failed: {}", e))
        }
    }
}

/// Map a non-success HTTP status to an embedding error
fn status_error(status: StatusCode, model: &str, body: &str) -> Error {
    if status == StatusCode::NOT_FOUND {
        Error::embedding(format!(
            "Embedding model {} is not available (run `ollama pull {}`): {}",
            model, model, body
        ))
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Error::embedding_transient(format!("Embedding failed: HTTP {} - {}", status, body))
    } else {
        Error::embedding(format!("Embedding failed: HTTP {} - {}", status, body))
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.retry
            .run("Ollama embedding", || self.embed_once(text))
            .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let missing = status_error(StatusCode::NOT_FOUND, "all-minilm", "model not found");
        assert!(!missing.is_transient());
        assert!(missing.to_string().contains("ollama pull all-minilm"));

        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "m", "").is_transient());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "m", "").is_transient());
        assert!(!status_error(StatusCode::BAD_REQUEST, "m", "").is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_embedding_error() {
        let config = EmbeddingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            max_retries: 0,
            ..EmbeddingConfig::default()
        };
        let embedder = OllamaEmbedder::new(&config).unwrap();

        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::Embedding { .. } | Error::Timeout { .. }));
        assert!(!embedder.health_check().await.unwrap());
    }
}
