//! Client error types

use thiserror::Error;

use crate::file_cache::CacheError;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: connect, timeout, body read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status without a readable error envelope
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The server answered `success: false`
    #[error("API error {code:?}: {message}")]
    Api { code: Option<u16>, message: String },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
