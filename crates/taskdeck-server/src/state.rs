//! In-memory authoritative task state.
//!
//! Server-side durable storage is an external collaborator; this vault
//! implements the service contract the sync engine depends on,
//! including version-conflict detection and operation idempotency.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use uuid::Uuid;

use taskdeck_core::models::{OperationKind, SyncOperation, Task, TaskId, TaskPatch};
use taskdeck_core::remote::{ServerUpdate, SyncReport};

/// Per-instance task collection plus the bookkeeping needed for
/// offline sync: the client-id index for duplicate-create detection
/// and the set of already-applied operation ids.
#[derive(Debug, Default)]
pub struct TaskVault {
    tasks: HashMap<String, Task>,
    client_index: HashMap<String, String>,
    applied_ops: HashSet<String>,
}

impl TaskVault {
    /// All tasks, newest first
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Point lookup, resolving client-generated ids through the index
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(&self.resolve(id))
    }

    /// Create a task with a server-assigned id and `version = 1`.
    /// A known `client_id` returns the previously-created record
    /// instead of a duplicate.
    pub fn create(
        &mut self,
        title: &str,
        description: Option<String>,
        client_id: Option<&TaskId>,
        user_id: &str,
    ) -> Task {
        if let Some(existing) = client_id
            .and_then(|cid| self.client_index.get(cid.as_str()))
            .and_then(|id| self.tasks.get(id))
        {
            return existing.clone();
        }

        let now = Utc::now();
        let task = Task {
            id: TaskId::from(Uuid::now_v7().to_string()),
            title: title.to_string(),
            description,
            completed: false,
            created_at: now,
            updated_at: now,
            user_id: user_id.to_string(),
            version: 1,
        };
        if let Some(cid) = client_id {
            self.client_index
                .insert(cid.to_string(), task.id.to_string());
        }
        self.tasks.insert(task.id.to_string(), task.clone());
        task
    }

    /// Merge provided fields, bump `version` and `updated_at`
    pub fn update(&mut self, id: &TaskId, patch: &TaskPatch) -> Option<Task> {
        let key = self.resolve(id);
        let task = self.tasks.get_mut(&key)?;
        task.apply(patch);
        Some(task.clone())
    }

    /// Remove a task; returns whether it existed
    pub fn delete(&mut self, id: &TaskId) -> bool {
        let key = self.resolve(id);
        self.tasks.remove(&key).is_some()
    }

    /// Apply a batch of queued client operations in order.
    ///
    /// Semantics per operation:
    /// - an already-applied operation id counts as synced without
    ///   re-applying (idempotent retry after a lost response)
    /// - create: duplicate client ids short-circuit; otherwise the
    ///   task is created and the id mapping is reported back
    /// - update: a server version newer than the operation's base
    ///   version is a conflict; the server record is reported and the
    ///   operation is not applied
    /// - delete: applied if the target still exists
    pub fn apply_operations(&mut self, operations: &[SyncOperation], user_id: &str) -> SyncReport {
        let mut report = SyncReport::default();

        for op in operations {
            if self.applied_ops.contains(&op.id) {
                report.synced += 1;
                continue;
            }

            match op.kind {
                OperationKind::Create => {
                    let title = op.payload["title"].as_str().unwrap_or_default();
                    if title.trim().is_empty() {
                        tracing::warn!(op_id = %op.id, "skipping create without title");
                        continue;
                    }
                    let description = op.payload["description"]
                        .as_str()
                        .map(std::string::ToString::to_string);
                    let task = self.create(title, description, Some(&op.task_id), user_id);
                    report.server_updates.push(ServerUpdate::Created {
                        client_id: op.task_id.clone(),
                        task,
                    });
                    report.synced += 1;
                }
                OperationKind::Update => {
                    let key = self.resolve(&op.task_id);
                    let Some(task) = self.tasks.get_mut(&key) else {
                        tracing::warn!(task_id = %op.task_id, "update target not found");
                        continue;
                    };
                    if task.version > op.base_version {
                        report.conflicts.push(task.clone());
                        continue;
                    }
                    let patch: TaskPatch =
                        serde_json::from_value(op.payload.clone()).unwrap_or_default();
                    task.apply(&patch);
                    report
                        .server_updates
                        .push(ServerUpdate::Updated { task: task.clone() });
                    report.synced += 1;
                }
                OperationKind::Delete => {
                    let key = self.resolve(&op.task_id);
                    if self.tasks.remove(&key).is_some() {
                        report.server_updates.push(ServerUpdate::Deleted {
                            task_id: op.task_id.clone(),
                        });
                    }
                    report.synced += 1;
                }
            }
            self.applied_ops.insert(op.id.clone());
        }

        report
    }

    fn resolve(&self, id: &TaskId) -> String {
        self.client_index
            .get(id.as_str())
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskdeck_core::models::TaskDraft;

    fn queued_create(title: &str) -> SyncOperation {
        let task = Task::new_local(&TaskDraft::new(title, None).unwrap(), "u1");
        SyncOperation::create(&task)
    }

    #[test]
    fn create_assigns_version_one() {
        let mut vault = TaskVault::default();
        let task = vault.create("First", None, None, "u1");
        assert_eq!(task.version, 1);
        assert!(!task.id.is_local());
        assert_eq!(vault.list().len(), 1);
    }

    #[test]
    fn duplicate_client_id_returns_existing() {
        let mut vault = TaskVault::default();
        let cid = TaskId::local();
        let first = vault.create("Once", None, Some(&cid), "u1");
        let second = vault.create("Once", None, Some(&cid), "u1");
        assert_eq!(first.id, second.id);
        assert_eq!(vault.list().len(), 1);
    }

    #[test]
    fn update_bumps_version() {
        let mut vault = TaskVault::default();
        let task = vault.create("Bump", None, None, "u1");
        let patch = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        let updated = vault.update(&task.id, &patch).unwrap();
        assert_eq!(updated.version, 2);
        assert!(updated.completed);
    }

    #[test]
    fn stale_update_reports_conflict() {
        let mut vault = TaskVault::default();
        let task = vault.create("Contested", None, None, "u1");
        vault
            .update(
                &task.id,
                &TaskPatch {
                    title: Some("Server edit".to_string()),
                    ..TaskPatch::default()
                },
            )
            .unwrap();

        // Client op based on version 1, server is at 2
        let op = SyncOperation::update(
            &task.id,
            &TaskPatch {
                completed: Some(true),
                ..TaskPatch::default()
            },
            1,
        );
        let report = vault.apply_operations(&[op], "u1");

        assert_eq!(report.synced, 0);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].title, "Server edit");
        assert!(!vault.get(&task.id).unwrap().completed);
    }

    #[test]
    fn replayed_batch_is_idempotent() {
        let mut vault = TaskVault::default();
        let op = queued_create("Exactly once");

        let first = vault.apply_operations(std::slice::from_ref(&op), "u1");
        assert_eq!(first.synced, 1);
        assert_eq!(vault.list().len(), 1);

        // Same batch again, as if the response had been lost
        let second = vault.apply_operations(std::slice::from_ref(&op), "u1");
        assert_eq!(second.synced, 1);
        assert!(second.server_updates.is_empty());
        assert_eq!(vault.list().len(), 1);
    }

    #[test]
    fn batch_resolves_client_ids_for_followup_ops() {
        let mut vault = TaskVault::default();
        let local = Task::new_local(&TaskDraft::new("Chained", None).unwrap(), "u1");
        let create = SyncOperation::create(&local);
        let update = SyncOperation::update(
            &local.id,
            &TaskPatch {
                completed: Some(true),
                ..TaskPatch::default()
            },
            1,
        );
        let delete_later = SyncOperation::delete(&local.id, 2);

        let report = vault.apply_operations(&[create, update], "u1");
        assert_eq!(report.synced, 2);
        let listed = vault.list();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].completed);
        assert_eq!(listed[0].version, 2);

        let report = vault.apply_operations(&[delete_later], "u1");
        assert_eq!(report.synced, 1);
        assert!(vault.list().is_empty());
    }
}
