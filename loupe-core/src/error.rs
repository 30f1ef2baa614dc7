//! Error types for the Loupe core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering LLM transport, caching, brief/configuration, and pipeline
//! preconditions. Per-interview and per-substep failures are handled at
//! their local boundary (degrade to empty defaults) and only precondition
//! violations surface as hard errors from a run.

use std::path::PathBuf;

/// Top-level error type for the Loupe core library.
#[derive(Debug, thiserror::Error)]
pub enum LoupeError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No transcripts supplied; nothing to analyze")]
    NoTranscripts,

    #[error("Analysis run was cancelled")]
    Cancelled,

    #[error("Report rendering failed: {message}")]
    Render { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from LLM endpoint interactions.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Non-2xx HTTP response. The original status and body are retained
    /// verbatim for log diagnosis.
    #[error("API request failed with HTTP {status}: {body}")]
    ApiRequest { status: u16, body: String },

    #[error("Authentication failed (HTTP 401): {body}")]
    AuthFailed { body: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Response parse error: {message}")]
    ResponseParse { message: String },
}

impl LlmError {
    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::Timeout { .. } | LlmError::Connection { .. }
        )
    }
}

/// Errors from the response cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache directory unavailable: {path}")]
    DirUnavailable { path: PathBuf },

    #[error("Cache read failed for key {key}: {message}")]
    ReadFailed { key: String, message: String },

    #[error("Cache write failed for key {key}: {message}")]
    WriteFailed { key: String, message: String },
}

/// Errors from the configuration layer.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API key not available: set the '{var}' environment variable")]
    ApiKeyMissing { var: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `LoupeError`.
pub type Result<T> = std::result::Result<T, LoupeError>;
