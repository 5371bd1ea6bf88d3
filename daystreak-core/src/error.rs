//! Error types for daystreak-core

use thiserror::Error;

/// Main error type for the daystreak-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Local tier database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Remote statistics tier unreachable or rejected the request
    #[error("remote error: {0}")]
    Remote(String),
}

/// Result type alias for daystreak-core
pub type Result<T> = std::result::Result<T, Error>;
