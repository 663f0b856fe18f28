//! Remote task service boundary
//!
//! The sync engine consumes the remote authority exclusively through
//! the [`RemoteTaskService`] trait, so tests can substitute an
//! in-memory fake for the HTTP client.

mod http;

pub use http::HttpRemoteClient;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{SyncOperation, Task, TaskDraft, TaskId, TaskPatch};

/// Errors from the remote task service, split by how the engine
/// reacts: network failures fall back to the offline queue,
/// authentication failures are fatal to the attempt (outbox
/// preserved), validation failures surface to the caller.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network failure: {0}")]
    Network(String),
    #[error("Authentication rejected: {0}")]
    Unauthorized(String),
    #[error("Invalid payload: {0}")]
    Validation(String),
    #[error("Remote API error: {0}")]
    Api(String),
}

impl RemoteError {
    /// Whether the engine may retry this failure through the outbox
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// One server-side effect of a drained batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerUpdate {
    /// An offline-created task was accepted; carries the temporary
    /// client id alongside the authoritative record
    #[serde(rename_all = "camelCase")]
    Created { client_id: TaskId, task: Task },
    /// An update was applied; carries the full server record
    Updated { task: Task },
    /// A deletion was applied
    #[serde(rename_all = "camelCase")]
    Deleted { task_id: TaskId },
}

/// Result of a batch-sync call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Number of accepted operations
    pub synced: usize,
    /// Server-held tasks whose version invalidated a queued change
    pub conflicts: Vec<Task>,
    /// Applied effects, including temporary-id reconciliation
    pub server_updates: Vec<ServerUpdate>,
}

/// Network API exposing the per-user task collection and the
/// batch-sync endpoint.
#[allow(async_fn_in_trait)]
pub trait RemoteTaskService {
    /// Full authoritative task list
    async fn list(&self) -> RemoteResult<Vec<Task>>;

    /// Create a task; the server assigns the final id and `version = 1`.
    /// `client_id` is stored server-side for duplicate-create detection.
    async fn create(&self, draft: &TaskDraft, client_id: &TaskId) -> RemoteResult<Task>;

    /// Partial update; the server increments `version` and returns the
    /// full record
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> RemoteResult<Task>;

    /// Delete by id
    async fn delete(&self, id: &TaskId) -> RemoteResult<TaskId>;

    /// Submit queued operations in enqueue order
    async fn sync_operations(&self, operations: &[SyncOperation]) -> RemoteResult<SyncReport>;
}
