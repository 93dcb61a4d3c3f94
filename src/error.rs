//! Error types for wasim
//!
//! This module defines the error types used throughout the simulator,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for simulator operations
///
/// Covers configuration loading, history store queries, reply service
/// calls, and the terminal surface.
#[derive(Error, Debug)]
pub enum SimulatorError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// History store query errors (HTTP status, decoding)
    #[error("History store error: {0}")]
    Store(String),

    /// The history store was built without credentials
    #[error("History store is not configured (set store.url and store.anon_key)")]
    StoreNotConfigured,

    /// The reply service answered with a non-success status
    ///
    /// The message is the service's `detail` field when present.
    #[error("{0}")]
    Reply(String),

    /// The reply service answered with a success status but no usable reply
    #[error("Malformed reply service response: {0}")]
    MalformedReply(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Line editor errors
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type alias for simulator operations
///
/// Uses `anyhow::Error` so callers can attach context while still being
/// able to downcast to [`SimulatorError`].
pub type Result<T> = anyhow::Result<T>;
