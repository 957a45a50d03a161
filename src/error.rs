//! Error types for the MapMyFitness client
//!
//! This module defines all error types used throughout the library,
//! using `thiserror` for ergonomic error handling.
//!
//! The session and request layers surface distinct variants so callers can
//! tell a missing authorization apart from a rejected handshake, a network
//! failure, or a body that does not match the configured response format.

use thiserror::Error;

/// Main error type for MapMyFitness client operations
///
/// Every fallible operation in the library returns one of these variants.
/// None of them are retried or suppressed by the library itself.
#[derive(Error, Debug)]
pub enum MmfError {
    /// Invalid construction parameters or configuration values
    /// (for example an unknown response format)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A signed API call was attempted without a stored access token
    #[error("Authorization required: no access token is stored, run the OAuth handshake first")]
    AuthRequired,

    /// The provider rejected or could not complete the OAuth handshake
    #[error("Authorization failed: {0}")]
    AuthFailure(String),

    /// Network or HTTP-layer failure while talking to the API
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded in the configured format
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The API answered a catalog call with a non-success status
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code returned by the API
        status: u16,
        /// Message or body returned by the API
        message: String,
    },

    /// The requested token is not present in token storage
    #[error("Token not found: {0}")]
    TokenNotFound(String),

    /// Token storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Request parameters could not be flattened into key/value pairs
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for MapMyFitness client operations
///
/// The error type is the concrete [`MmfError`] so callers can match on the
/// failure kind. The `mmf` binary converts into `anyhow::Error` at the top
/// level.
pub type Result<T> = std::result::Result<T, MmfError>;
