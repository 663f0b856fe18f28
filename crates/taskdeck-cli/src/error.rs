use std::io;

use thiserror::Error;

use taskdeck_core::remote::RemoteError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] taskdeck_core::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No task title provided")]
    EmptyTitle,
    #[error("Task not found for id/prefix: {0}")]
    TaskNotFound(String),
    #[error("{0}")]
    AmbiguousTaskId(String),
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),
    #[error(
        "Sync is not configured. Set TASKDECK_API_URL and TASKDECK_API_TOKEN to enable `taskdeck sync`."
    )]
    SyncNotConfigured,
}
