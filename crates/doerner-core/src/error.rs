//! Error types for two-party key generation

use crate::oblivious::OtError;
use thiserror::Error;

/// Result type alias for key generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or running key generation
///
/// None of these are retried by the core. A session that fails must be
/// restarted by the caller with a fresh session id.
#[derive(Debug, Error)]
pub enum Error {
    /// Session or round construction failed (bad session id, unsupported group)
    #[error("Setup error: {0}")]
    Setup(String),

    /// Malformed, out-of-order or missing peer message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A commitment opening or proof check failed in the final round
    #[error("Consistency check failed: {0}")]
    Consistency(String),

    /// Failure inside the correlated OT setup
    #[error(transparent)]
    Ot(#[from] OtError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Relay error
    #[error("Relay error: {0}")]
    Relay(String),

    /// Timeout waiting for message
    #[error("Timeout waiting for {0}")]
    Timeout(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
