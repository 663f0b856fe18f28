//! The offline-first sync engine
//!
//! Owns every write into the local store and the outbox. A mutation is
//! always applied locally first; if the network is reachable the
//! matching remote call runs immediately, otherwise (or when that call
//! fails) the mutation is captured as a durable [`SyncOperation`] and
//! replayed on the next drain. Conflicts reported by the batch
//! endpoint are persisted and resolved only by an explicit caller
//! decision, never silently.

use std::collections::HashSet;

use tokio::sync::Mutex;

use crate::connectivity::ConnectivityMonitor;
use crate::db::TaskStore;
use crate::error::{Error, Result};
use crate::models::{SyncConflict, SyncOperation, Task, TaskDraft, TaskId, TaskPatch};
use crate::remote::{RemoteError, RemoteTaskService, ServerUpdate};
use crate::state::{SyncState, SyncStatus};

/// Summary of one outbox drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Operations accepted by the remote
    pub synced: usize,
    /// Conflicts recorded for caller resolution
    pub conflicts: usize,
}

/// Orchestrates local-first writes, outbox drains, and conflict
/// reconciliation against a remote authority.
///
/// Explicitly constructed with its collaborators so tests can inject
/// fakes; nothing here is global.
pub struct SyncEngine<R, S> {
    store: S,
    remote: R,
    connectivity: ConnectivityMonitor,
    user_id: String,
    // A drain is not reentrant: a second request queues behind the
    // first and then finds the outbox already drained.
    drain_lock: Mutex<()>,
}

impl<R, S> SyncEngine<R, S>
where
    R: RemoteTaskService,
    S: TaskStore,
{
    /// Create an engine over its injected collaborators
    pub fn new(
        store: S,
        remote: R,
        connectivity: ConnectivityMonitor,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            user_id: user_id.into(),
            drain_lock: Mutex::new(()),
        }
    }

    /// The connectivity monitor this engine reacts to
    pub const fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Read the cached task collection
    pub async fn tasks(&self) -> Result<Vec<Task>> {
        self.store.all_tasks().await
    }

    /// Point lookup in the cache
    pub async fn task(&self, id: &TaskId) -> Result<Option<Task>> {
        self.store.task(id).await
    }

    /// Unresolved conflicts awaiting a decision
    pub async fn conflicts(&self) -> Result<Vec<SyncConflict>> {
        self.store.conflicts().await
    }

    /// Initial load: prefer the remote authority, fall back to the
    /// cache so the caller sees last-known-good data instead of an
    /// error when the network is down.
    pub async fn load_tasks(&self) -> Result<Vec<Task>> {
        // Drain first: the wholesale cache replace below must not
        // clobber offline-created tasks still waiting in the outbox.
        if self.connectivity.is_online() && !self.store.unsynced_operations().await?.is_empty() {
            if let Err(error) = self.sync_now().await {
                tracing::warn!(%error, "pre-load drain failed, queued changes kept");
            }
            if !self.store.unsynced_operations().await?.is_empty() {
                // Still-queued mutations would be hidden by a cache
                // replace; serve the local view until the drain lands.
                return self.store.all_tasks().await;
            }
        }

        match self.remote.list().await {
            Ok(tasks) => {
                self.store.bulk_put_tasks(&tasks).await?;
                self.connectivity.set_online(true);
                Ok(tasks)
            }
            Err(error) if error.is_retryable() => {
                tracing::info!(%error, "remote list unavailable, serving cached tasks");
                self.connectivity.set_online(false);
                self.store.all_tasks().await
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Create a task. Applied optimistically with a temporary id;
    /// reconciled to the server-assigned id when online.
    pub async fn create_task(&self, draft: TaskDraft) -> Result<Task> {
        let task = Task::new_local(&draft, &self.user_id);
        self.store.put_task(&task).await?;

        if self.connectivity.is_online() {
            match self.remote.create(&draft, &task.id).await {
                Ok(server_task) => {
                    self.store.rewrite_task_id(&task.id, &server_task.id).await?;
                    self.store.put_task(&server_task).await?;
                    return Ok(server_task);
                }
                Err(error) => {
                    self.defer_after_failure(error, SyncOperation::create(&task))
                        .await?;
                }
            }
        } else {
            self.store.enqueue(&SyncOperation::create(&task)).await?;
        }
        Ok(task)
    }

    /// Merge a partial update into a task. The local record always
    /// changes; the remote call is skipped for tasks the server has
    /// never seen (temporary id) and deferred on failure.
    pub async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Task> {
        patch.validate()?;
        let mut task = self
            .store
            .task(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let base_version = task.version;
        task.apply(&patch);
        self.store.put_task(&task).await?;

        if self.connectivity.is_online() && !id.is_local() {
            match self.remote.update(id, &patch).await {
                Ok(server_task) => {
                    self.store.put_task(&server_task).await?;
                    return Ok(server_task);
                }
                Err(error) => {
                    self.defer_after_failure(error, SyncOperation::update(id, &patch, base_version))
                        .await?;
                }
            }
        } else {
            self.store
                .enqueue(&SyncOperation::update(id, &patch, base_version))
                .await?;
        }
        Ok(task)
    }

    /// Remove a task locally and propagate the deletion
    pub async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let task = self
            .store
            .task(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        self.store.delete_task(id).await?;

        if self.connectivity.is_online() && !id.is_local() {
            match self.remote.delete(id).await {
                Ok(_) => Ok(()),
                Err(error) => {
                    self.defer_after_failure(error, SyncOperation::delete(id, task.version))
                        .await
                }
            }
        } else {
            self.store
                .enqueue(&SyncOperation::delete(id, task.version))
                .await
        }
    }

    /// Drain the outbox: submit every unsynced operation in enqueue
    /// order as one batch, apply the server's effects, and record any
    /// conflicts for explicit resolution.
    pub async fn sync_now(&self) -> Result<DrainOutcome> {
        let _guard = self.drain_lock.lock().await;

        let ops = self.store.unsynced_operations().await?;
        if ops.is_empty() {
            return Ok(DrainOutcome::default());
        }
        tracing::debug!(operations = ops.len(), "draining outbox");

        let report = match self.remote.sync_operations(&ops).await {
            Ok(report) => report,
            Err(error) => {
                // Operations stay unsynced; the next connectivity
                // transition or manual trigger retries them.
                if error.is_retryable() {
                    self.connectivity.set_online(false);
                }
                return Err(error.into());
            }
        };

        // Authoritative effects first, including temporary-id
        // reconciliation for offline-created tasks.
        for update in &report.server_updates {
            match update {
                ServerUpdate::Created { client_id, task } => {
                    self.store.rewrite_task_id(client_id, &task.id).await?;
                    self.store.put_task(task).await?;
                }
                ServerUpdate::Updated { task } => self.store.put_task(task).await?,
                ServerUpdate::Deleted { task_id } => self.store.delete_task(task_id).await?,
            }
        }

        let conflicted: HashSet<&str> = report
            .conflicts
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        for server_task in &report.conflicts {
            let local = self
                .store
                .task(&server_task.id)
                .await?
                .unwrap_or_else(|| server_task.clone());
            tracing::warn!(
                task_id = %server_task.id,
                local_version = local.version,
                server_version = server_task.version,
                "sync conflict recorded"
            );
            self.store
                .put_conflict(&SyncConflict::new(local, server_task.clone()))
                .await?;
        }

        // A conflicted operation leaves the queue: its intent now
        // lives in the conflict record until the user decides.
        let mut acknowledged = 0;
        for op in &ops {
            if conflicted.contains(op.task_id.as_str()) {
                self.store.delete_operation(&op.id).await?;
            } else {
                self.store.mark_synced(&op.id).await?;
                acknowledged += 1;
            }
        }
        if acknowledged > report.synced {
            // Operations the server skipped (e.g. the target no longer
            // exists) are purged rather than retried forever.
            tracing::warn!(
                acknowledged,
                accepted = report.synced,
                "server skipped operations; purging them from the outbox"
            );
        }
        self.store.clear_synced().await?;
        self.connectivity.set_online(true);

        Ok(DrainOutcome {
            synced: report.synced,
            conflicts: report.conflicts.len(),
        })
    }

    /// Resolve a recorded conflict with the user's whole-record
    /// choice. `use_local` pushes the local record to the server as a
    /// forced update; otherwise the stored server snapshot overwrites
    /// the local copy with no further network write.
    pub async fn resolve_conflict(&self, task_id: &TaskId, use_local: bool) -> Result<Task> {
        let conflict = self
            .store
            .take_conflict(task_id)
            .await?
            .ok_or_else(|| Error::ConflictNotFound(task_id.to_string()))?;

        if use_local {
            match self.remote.update(task_id, &conflict.local.as_patch()).await {
                Ok(acknowledged) => {
                    self.store.put_task(&acknowledged).await?;
                    Ok(acknowledged)
                }
                Err(error) => {
                    // Keep the conflict so the decision can be retried
                    self.store.put_conflict(&conflict).await?;
                    if error.is_retryable() {
                        self.connectivity.set_online(false);
                    }
                    Err(error.into())
                }
            }
        } else {
            self.store.put_task(&conflict.remote).await?;
            Ok(conflict.remote)
        }
    }

    /// Current engine status for the persistent indicator
    pub async fn status(&self) -> Result<SyncStatus> {
        let pending_operations = self.store.unsynced_operations().await?.len();
        let conflicts = self.store.conflicts().await?.len();
        let state = if !self.connectivity.is_online() {
            SyncState::Offline
        } else if self.drain_lock.try_lock().is_err() {
            SyncState::Syncing
        } else if pending_operations == 0 {
            SyncState::Synced
        } else {
            SyncState::Error
        };
        Ok(SyncStatus {
            state,
            pending_operations,
            conflicts,
        })
    }

    /// React to connectivity transitions: every offline→online edge
    /// triggers one coordinated drain. Runs until the monitor is
    /// dropped.
    pub async fn run_connectivity_loop(&self) {
        let mut rx = self.connectivity.subscribe();
        loop {
            if rx.changed().await.is_err() {
                break;
            }
            let online = *rx.borrow_and_update();
            if online {
                if let Err(error) = self.sync_now().await {
                    tracing::warn!(%error, "drain after reconnect failed");
                }
            }
        }
    }

    /// A failed online write never loses the mutation: network
    /// failures defer to the outbox silently, server-side failures
    /// (auth rejection, 5xx) defer AND propagate so the outbox
    /// survives a re-login or a server recovery. Only a validation
    /// rejection surfaces without queuing, since replaying a payload
    /// the server deems invalid can never succeed.
    async fn defer_after_failure(&self, error: RemoteError, op: SyncOperation) -> Result<()> {
        match error {
            RemoteError::Network(reason) => {
                tracing::warn!(
                    reason,
                    kind = op.kind.as_str(),
                    task_id = %op.task_id,
                    "remote call failed, deferring to outbox"
                );
                self.connectivity.set_online(false);
                self.store.enqueue(&op).await
            }
            RemoteError::Unauthorized(_) | RemoteError::Api(_) => {
                self.store.enqueue(&op).await?;
                Err(error.into())
            }
            RemoteError::Validation(_) => Err(error.into()),
        }
    }
}
