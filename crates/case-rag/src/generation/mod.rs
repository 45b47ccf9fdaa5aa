//! Prompt construction for grounded case answers

pub mod prompt;

pub use prompt::{PromptBuilder, FALLBACK_ANSWER};
