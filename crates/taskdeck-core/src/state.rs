//! Shared sync state types.

use serde::Serialize;

/// Coarse sync state surfaced as the persistent status indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Network considered unreachable; writes go to the outbox
    Offline,
    /// A drain is currently in flight
    Syncing,
    /// Online with an empty outbox
    Synced,
    /// Online but unsynced operations remain (last drain failed or
    /// has not run yet)
    Error,
}

/// Snapshot of the engine's sync situation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub state: SyncState,
    pub pending_operations: usize,
    pub conflicts: usize,
}
