//! Error types for the PHILOVOID domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all PHILOVOID operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Gateway errors ---
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the hosted generative-language API.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("API key not found. Please ensure the PHILOVOID_API_KEY environment variable is set.")]
    MissingCredential,

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of the opaque blob store backing the conversation log.
///
/// These are never surfaced to the user — callers log and continue.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Read failed: {0}")]
    Read(String),

    #[error("Write failed: {0}")]
    Write(String),
}
