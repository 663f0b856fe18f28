//! Durable outbox record for one pending mutation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::{Task, TaskId, TaskPatch};

/// Kind of queued mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown operation kind: {other}")),
        }
    }
}

/// A durable record of one pending mutation intent.
///
/// The operation id doubles as the idempotency key: the batch-sync
/// endpoint deduplicates by it, so a retried batch whose response was
/// lost cannot double-apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOperation {
    /// Locally-generated unique id (UUID v7)
    pub id: String,
    /// Mutation kind
    pub kind: OperationKind,
    /// Target task identity at enqueue time
    pub task_id: TaskId,
    /// Partial payload needed to replay the operation
    pub payload: serde_json::Value,
    /// Task version the mutation was based on
    pub base_version: i64,
    /// Enqueue timestamp; replay order within a task follows it
    pub timestamp: DateTime<Utc>,
    /// False until the remote service has accepted the operation
    pub synced: bool,
}

impl SyncOperation {
    fn new(kind: OperationKind, task_id: TaskId, payload: serde_json::Value, base_version: i64) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            kind,
            task_id,
            payload,
            base_version,
            timestamp: Utc::now(),
            synced: false,
        }
    }

    /// Queue the creation of a locally-applied task
    #[must_use]
    pub fn create(task: &Task) -> Self {
        let payload = serde_json::json!({
            "title": task.title,
            "description": task.description,
        });
        Self::new(OperationKind::Create, task.id.clone(), payload, task.version)
    }

    /// Queue a partial update based on the pre-patch version
    #[must_use]
    pub fn update(task_id: &TaskId, patch: &TaskPatch, base_version: i64) -> Self {
        let payload = serde_json::to_value(patch).unwrap_or_default();
        Self::new(OperationKind::Update, task_id.clone(), payload, base_version)
    }

    /// Queue a deletion
    #[must_use]
    pub fn delete(task_id: &TaskId, base_version: i64) -> Self {
        Self::new(
            OperationKind::Delete,
            task_id.clone(),
            serde_json::Value::Null,
            base_version,
        )
    }

    /// Decode the payload back into a patch (update operations)
    pub fn patch(&self) -> crate::error::Result<TaskPatch> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDraft;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_captures_replay_payload() {
        let task = Task::new_local(
            &TaskDraft::new("Buy milk", Some("2 liters".to_string())).unwrap(),
            "u1",
        );
        let op = SyncOperation::create(&task);

        assert_eq!(op.kind, OperationKind::Create);
        assert_eq!(op.task_id, task.id);
        assert_eq!(op.payload["title"], "Buy milk");
        assert!(!op.synced);
    }

    #[test]
    fn test_update_roundtrips_patch() {
        let patch = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        let op = SyncOperation::update(&TaskId::from("srv-1"), &patch, 3);

        assert_eq!(op.base_version, 3);
        assert_eq!(op.patch().unwrap(), patch);
    }

    #[test]
    fn test_operation_ids_unique() {
        let id = TaskId::from("srv-1");
        let a = SyncOperation::delete(&id, 1);
        let b = SyncOperation::delete(&id, 1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_kind_string_roundtrip() {
        for kind in [OperationKind::Create, OperationKind::Update, OperationKind::Delete] {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
    }
}
