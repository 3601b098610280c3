//! Error handling for the PTZ core

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Session establishment failed after exhausting the retry budget.
    /// Fatal for the camera until `reset()` is called.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A motion command was issued without a live session.
    /// Recoverable by calling `connect()`.
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// A single command was rejected or timed out by the device
    #[error("Device error: {0}")]
    Device(String),

    /// Validation error (malformed input rejected before any device call)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Patrol requested with fewer presets than the minimum
    #[error("Insufficient presets: need at least {required}, got {actual}")]
    InsufficientPresets { required: usize, actual: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
