//! Error types for tasks-enrich.

use thiserror::Error;

/// Result type alias using tasks-enrich's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tasks-enrich operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Inference service returned an error
    #[error("Inference error: {0}")]
    Inference(String),

    /// Operation exceeded its time bound
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// A value could not be parsed (e.g. an extracted timestamp)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Record with the given ID no longer exists in the store
    #[error("Record not found: {0}")]
    RecordNotFound(uuid::Uuid),

    /// A notification index no longer maps to a live record
    #[error("Index {index} out of range for {record_type} ({len} records)")]
    Resolution {
        record_type: String,
        index: usize,
        len: usize,
    },

    /// Record store failure (poisoned lock, aborted write)
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
