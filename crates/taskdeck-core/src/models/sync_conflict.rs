//! Sync conflict model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::{Task, TaskId};

/// A recorded conflict awaiting an explicit user decision.
///
/// Both snapshots are persisted at detection time so that keeping the
/// remote side never needs another network round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict {
    /// Task involved in the conflict
    pub task_id: TaskId,
    /// The locally-held record at detection time
    pub local: Task,
    /// The server-held record that invalidated the queued change
    pub remote: Task,
    /// Detection timestamp
    pub detected_at: DateTime<Utc>,
}

impl SyncConflict {
    /// Record a conflict between a local and a server task
    #[must_use]
    pub fn new(local: Task, remote: Task) -> Self {
        Self {
            task_id: remote.id.clone(),
            local,
            remote,
            detected_at: Utc::now(),
        }
    }
}
