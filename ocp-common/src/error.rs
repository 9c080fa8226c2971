//! Common error types for OCP

use thiserror::Error;

/// Common result type for OCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across OCP crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization of a stored JSON column failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
