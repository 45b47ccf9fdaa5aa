//! LLM provider trait for answer generation

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::Result;

/// Trait for hosted-model text generation
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API (gemini-2.0-flash)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a fully rendered prompt and return the generated text verbatim
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is reachable and the credential is accepted
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Model identifier
    fn model(&self) -> String;
}
