//! Error types for the case Q&A system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for case-rag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Case Q&A errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credential, bad config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// PDF could not be read or parsed
    #[error("Failed to load '{filename}': {message}")]
    Load { filename: String, message: String },

    /// Upload is not a PDF
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding computation failed
    #[error("Embedding generation failed: {message}")]
    Embedding { message: String, transient: bool },

    /// Vector store read/write failure
    #[error("Vector store error: {0}")]
    Storage(String),

    /// Query against a collection that was never built
    #[error("No indexed document: {0}")]
    NotIndexed(String),

    /// Hosted model call failed
    #[error("Answer generation failed: {message}")]
    Generation { message: String, transient: bool },

    /// A network call exceeded its configured timeout
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Blank question submitted
    #[error("Please enter a question.")]
    EmptyQuestion,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a load error
    pub fn load(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a permanent embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            transient: false,
        }
    }

    /// Create an embedding error worth retrying
    pub fn embedding_transient(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            transient: true,
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a permanent generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            transient: false,
        }
    }

    /// Create a generation error worth retrying
    pub fn generation_transient(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            transient: true,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Rate limits, 5xx responses, dropped connections and timeouts are
    /// transient. Authorization failures and malformed requests are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Embedding { transient, .. } | Error::Generation { transient, .. } => *transient,
            Error::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Load { .. } => "load_error",
            Error::UnsupportedFileType(_) => "unsupported_type",
            Error::Embedding { .. } => "embedding_error",
            Error::Storage(_) => "storage_error",
            Error::NotIndexed(_) => "not_indexed",
            Error::Generation { .. } => "generation_error",
            Error::Timeout { .. } => "timeout",
            Error::EmptyQuestion => "warning",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status used when the error reaches the API surface
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Load { .. } | Error::EmptyQuestion | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::NotIndexed(_) => StatusCode::CONFLICT,
            Error::Embedding { .. } | Error::Generation { .. } => StatusCode::BAD_GATEWAY,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::Config(_) | Error::Storage(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
