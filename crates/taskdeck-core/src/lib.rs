//! taskdeck-core - Core library for Taskdeck
//!
//! This crate contains the shared models, the durable local store and
//! outbox, the connectivity monitor, and the offline-first sync engine
//! used by all Taskdeck interfaces.

pub mod config;
pub mod connectivity;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod state;
pub mod sync;

pub use connectivity::ConnectivityMonitor;
pub use error::{Error, Result};
pub use models::{SyncConflict, SyncOperation, Task, TaskDraft, TaskId, TaskPatch};
pub use state::{SyncState, SyncStatus};
pub use sync::SyncEngine;
