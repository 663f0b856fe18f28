//! Error types for taskdeck-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using taskdeck-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in taskdeck-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Task not found
    #[error("Task not found: {0}")]
    NotFound(String),

    /// No recorded conflict for a task
    #[error("No pending conflict for task: {0}")]
    ConflictNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote task service error
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}
