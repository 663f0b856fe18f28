//! Data models for taskdeck-core

mod sync_conflict;
mod sync_operation;
mod task;

pub use sync_conflict::SyncConflict;
pub use sync_operation::{OperationKind, SyncOperation};
pub use task::{Task, TaskDraft, TaskId, TaskPatch};
