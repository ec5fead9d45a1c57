//! Error types for the SOP guide

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the indexer, the query pipeline and the HTTP layer
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required secret is not present in the environment
    #[error("Missing credential: set {0} in the environment or in a .env file")]
    MissingCredential(String),

    /// The persisted index does not exist yet
    #[error("Index not found at '{}'. Run `sop-guide-indexer` first to build it", path.display())]
    IndexMissing { path: PathBuf },

    /// The persisted index was built with a different embedding model or dimension
    #[error("Incompatible index: {0}. Rebuild it with `sop-guide-indexer`")]
    IncompatibleIndex(String),

    /// Index storage could not be written
    #[error("Failed to write index to '{}': {source}", path.display())]
    IndexWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Index lookup error
    #[error("Index error: {0}")]
    Index(String),

    /// Generative model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// The generative model refused the prompt or the answer on safety grounds
    #[error("Content blocked by safety filters: {0}")]
    SafetyBlocked(String),

    /// The hosted service rejected the call because a usage quota is exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Uploaded image could not be decoded or has an unsupported format
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// Malformed client request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error must stop the process at startup
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::MissingCredential(_)
                | Self::IndexMissing { .. }
                | Self::IncompatibleIndex(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Only request-shape problems carry their message back to the client.
        let (status, error_type, message) = match &self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            Error::UnsupportedFileType(ext) => (
                StatusCode::BAD_REQUEST,
                "unsupported_type",
                format!("Unsupported file type: {}", ext),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::IndexMissing { .. } | Error::IncompatibleIndex(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "index_unavailable",
                "Knowledge base is not available".to_string(),
            ),
            Error::SafetyBlocked(_) | Error::QuotaExceeded(_) | Error::Llm(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "llm_error",
                "Generative model is not available".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal error".to_string(),
            ),
        };

        tracing::warn!("Request failed ({}): {}", error_type, self);

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
