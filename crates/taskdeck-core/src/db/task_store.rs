//! Task and outbox store implementation

use chrono::{DateTime, Utc};
use libsql::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::models::{OperationKind, SyncConflict, SyncOperation, Task, TaskId};

/// Trait for the durable local cache: the materialized task
/// collection, the mutation outbox, and the conflict journal.
///
/// The sync engine exclusively owns writes through this trait; the
/// presentation layer only reads task records.
#[allow(async_fn_in_trait)]
pub trait TaskStore {
    /// All cached tasks, most recently updated first
    async fn all_tasks(&self) -> Result<Vec<Task>>;

    /// Point lookup by id
    async fn task(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Insert-or-replace by id; idempotent
    async fn put_task(&self, task: &Task) -> Result<()>;

    /// Remove by id; no-op if absent
    async fn delete_task(&self, id: &TaskId) -> Result<()>;

    /// Wholesale replace of the task collection with an authoritative
    /// server list, inside one transaction
    async fn bulk_put_tasks(&self, tasks: &[Task]) -> Result<()>;

    /// Rewrite a task identity after the server assigns a final id.
    /// Updates the task row and every still-queued operation that
    /// references the old id.
    async fn rewrite_task_id(&self, from: &TaskId, to: &TaskId) -> Result<()>;

    /// Append an operation to the outbox
    async fn enqueue(&self, op: &SyncOperation) -> Result<()>;

    /// Every outbox entry in enqueue order
    async fn operations(&self) -> Result<Vec<SyncOperation>>;

    /// Outbox entries not yet accepted by the remote, in enqueue order
    async fn unsynced_operations(&self) -> Result<Vec<SyncOperation>>;

    /// Flag an operation as accepted by the remote
    async fn mark_synced(&self, op_id: &str) -> Result<()>;

    /// Remove a single outbox entry
    async fn delete_operation(&self, op_id: &str) -> Result<()>;

    /// Garbage-collect accepted outbox entries
    async fn clear_synced(&self) -> Result<()>;

    /// Record an unresolved conflict (insert-or-replace by task id)
    async fn put_conflict(&self, conflict: &SyncConflict) -> Result<()>;

    /// All unresolved conflicts, oldest first
    async fn conflicts(&self) -> Result<Vec<SyncConflict>>;

    /// Remove and return the conflict for a task, if any
    async fn take_conflict(&self, task_id: &TaskId) -> Result<Option<SyncConflict>>;
}

/// libSQL implementation of `TaskStore`
pub struct LibSqlTaskStore<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlTaskStore<'a> {
    /// Create a new store over the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_task(row: &Row) -> Result<Task> {
        let description = match row.get_value(2)? {
            libsql::Value::Text(text) => Some(text),
            _ => None,
        };
        Ok(Task {
            id: TaskId::from(row.get::<String>(0)?),
            title: row.get(1)?,
            description,
            completed: row.get::<i32>(3)? != 0,
            created_at: parse_timestamp(&row.get::<String>(4)?)?,
            updated_at: parse_timestamp(&row.get::<String>(5)?)?,
            user_id: row.get(6)?,
            version: row.get(7)?,
        })
    }

    fn parse_operation(row: &Row) -> Result<SyncOperation> {
        let kind: String = row.get(1)?;
        Ok(SyncOperation {
            id: row.get(0)?,
            kind: kind
                .parse::<OperationKind>()
                .map_err(Error::InvalidInput)?,
            task_id: TaskId::from(row.get::<String>(2)?),
            payload: serde_json::from_str(&row.get::<String>(3)?)?,
            base_version: row.get(4)?,
            timestamp: parse_timestamp(&row.get::<String>(5)?)?,
            synced: row.get::<i32>(6)? != 0,
        })
    }

    fn parse_conflict(row: &Row) -> Result<SyncConflict> {
        Ok(SyncConflict {
            task_id: TaskId::from(row.get::<String>(0)?),
            local: serde_json::from_str(&row.get::<String>(1)?)?,
            remote: serde_json::from_str(&row.get::<String>(2)?)?,
            detected_at: parse_timestamp(&row.get::<String>(3)?)?,
        })
    }

    async fn insert_task(&self, task: &Task) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO tasks
                 (id, title, description, completed, created_at, updated_at, user_id, version)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    task.id.as_str(),
                    task.title.as_str(),
                    task.description
                        .clone()
                        .map_or(libsql::Value::Null, libsql::Value::Text),
                    i32::from(task.completed),
                    task.created_at.to_rfc3339(),
                    task.updated_at.to_rfc3339(),
                    task.user_id.as_str(),
                    task.version,
                ],
            )
            .await?;
        Ok(())
    }
}

const TASK_COLUMNS: &str = "id, title, description, completed, created_at, updated_at, user_id, version";
const OP_COLUMNS: &str = "id, kind, task_id, payload, base_version, timestamp, synced";

impl TaskStore for LibSqlTaskStore<'_> {
    async fn all_tasks(&self) -> Result<Vec<Task>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY updated_at DESC"),
                (),
            )
            .await?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await? {
            tasks.push(Self::parse_task(&row)?);
        }
        Ok(tasks)
    }

    async fn task(&self, id: &TaskId) -> Result<Option<Task>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
                [id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_task(&row)?)),
            None => Ok(None),
        }
    }

    async fn put_task(&self, task: &Task) -> Result<()> {
        self.insert_task(task).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?", [id.as_str()])
            .await?;
        Ok(())
    }

    async fn bulk_put_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        self.conn.execute("DELETE FROM tasks", ()).await?;
        for task in tasks {
            if let Err(error) = self.insert_task(task).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(error);
            }
        }
        self.conn.execute("COMMIT", ()).await?;
        Ok(())
    }

    async fn rewrite_task_id(&self, from: &TaskId, to: &TaskId) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        self.conn
            .execute(
                "UPDATE OR REPLACE tasks SET id = ? WHERE id = ?",
                [to.as_str(), from.as_str()],
            )
            .await?;
        self.conn
            .execute(
                "UPDATE sync_queue SET task_id = ? WHERE task_id = ? AND synced = 0",
                [to.as_str(), from.as_str()],
            )
            .await?;
        self.conn.execute("COMMIT", ()).await?;
        Ok(())
    }

    async fn enqueue(&self, op: &SyncOperation) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sync_queue
                 (id, kind, task_id, payload, base_version, timestamp, synced)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    op.id.as_str(),
                    op.kind.as_str(),
                    op.task_id.as_str(),
                    serde_json::to_string(&op.payload)?,
                    op.base_version,
                    op.timestamp.to_rfc3339(),
                    i32::from(op.synced),
                ],
            )
            .await?;
        Ok(())
    }

    async fn operations(&self) -> Result<Vec<SyncOperation>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {OP_COLUMNS} FROM sync_queue ORDER BY timestamp, id"),
                (),
            )
            .await?;

        let mut ops = Vec::new();
        while let Some(row) = rows.next().await? {
            ops.push(Self::parse_operation(&row)?);
        }
        Ok(ops)
    }

    async fn unsynced_operations(&self) -> Result<Vec<SyncOperation>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {OP_COLUMNS} FROM sync_queue WHERE synced = 0 ORDER BY timestamp, id"
                ),
                (),
            )
            .await?;

        let mut ops = Vec::new();
        while let Some(row) = rows.next().await? {
            ops.push(Self::parse_operation(&row)?);
        }
        Ok(ops)
    }

    async fn mark_synced(&self, op_id: &str) -> Result<()> {
        self.conn
            .execute("UPDATE sync_queue SET synced = 1 WHERE id = ?", [op_id])
            .await?;
        Ok(())
    }

    async fn delete_operation(&self, op_id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_queue WHERE id = ?", [op_id])
            .await?;
        Ok(())
    }

    async fn clear_synced(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_queue WHERE synced = 1", ())
            .await?;
        Ok(())
    }

    async fn put_conflict(&self, conflict: &SyncConflict) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO conflicts (task_id, local_json, remote_json, detected_at)
                 VALUES (?, ?, ?, ?)",
                params![
                    conflict.task_id.as_str(),
                    serde_json::to_string(&conflict.local)?,
                    serde_json::to_string(&conflict.remote)?,
                    conflict.detected_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    async fn conflicts(&self) -> Result<Vec<SyncConflict>> {
        let mut rows = self
            .conn
            .query(
                "SELECT task_id, local_json, remote_json, detected_at
                 FROM conflicts ORDER BY detected_at",
                (),
            )
            .await?;

        let mut conflicts = Vec::new();
        while let Some(row) = rows.next().await? {
            conflicts.push(Self::parse_conflict(&row)?);
        }
        Ok(conflicts)
    }

    async fn take_conflict(&self, task_id: &TaskId) -> Result<Option<SyncConflict>> {
        let mut rows = self
            .conn
            .query(
                "SELECT task_id, local_json, remote_json, detected_at
                 FROM conflicts WHERE task_id = ?",
                [task_id.as_str()],
            )
            .await?;

        let conflict = match rows.next().await? {
            Some(row) => Some(Self::parse_conflict(&row)?),
            None => None,
        };

        if conflict.is_some() {
            self.conn
                .execute("DELETE FROM conflicts WHERE task_id = ?", [task_id.as_str()])
                .await?;
        }
        Ok(conflict)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|error| Error::InvalidInput(format!("invalid timestamp '{raw}': {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{TaskDraft, TaskPatch};
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn sample_task(title: &str) -> Task {
        Task::new_local(&TaskDraft::new(title, None).unwrap(), "u1")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_and_get_task() {
        let db = setup().await;
        let store = LibSqlTaskStore::new(db.connection());

        let task = sample_task("Buy milk");
        store.put_task(&task).await.unwrap();

        let fetched = store.task(&task.id).await.unwrap().unwrap();
        assert_eq!(fetched, task);
        assert!(store.task(&TaskId::from("missing")).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_task_is_idempotent_replace() {
        let db = setup().await;
        let store = LibSqlTaskStore::new(db.connection());

        let mut task = sample_task("Original");
        store.put_task(&task).await.unwrap();
        task.title = "Replaced".to_string();
        store.put_task(&task).await.unwrap();

        let tasks = store.all_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Replaced");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_task_absent_is_noop() {
        let db = setup().await;
        let store = LibSqlTaskStore::new(db.connection());
        store.delete_task(&TaskId::from("missing")).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bulk_put_replaces_collection() {
        let db = setup().await;
        let store = LibSqlTaskStore::new(db.connection());

        store.put_task(&sample_task("stale")).await.unwrap();

        let fresh = vec![sample_task("one"), sample_task("two")];
        store.bulk_put_tasks(&fresh).await.unwrap();

        let tasks = store.all_tasks().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|task| task.title != "stale"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_outbox_preserves_enqueue_order() {
        let db = setup().await;
        let store = LibSqlTaskStore::new(db.connection());

        let task = sample_task("ordered");
        let create = SyncOperation::create(&task);
        let update = SyncOperation::update(
            &task.id,
            &TaskPatch {
                completed: Some(true),
                ..TaskPatch::default()
            },
            1,
        );
        store.enqueue(&create).await.unwrap();
        store.enqueue(&update).await.unwrap();

        let ops = store.unsynced_operations().await.unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].id, create.id);
        assert_eq!(ops[1].id, update.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_synced_and_clear() {
        let db = setup().await;
        let store = LibSqlTaskStore::new(db.connection());

        let task = sample_task("gc");
        let op = SyncOperation::create(&task);
        store.enqueue(&op).await.unwrap();

        store.mark_synced(&op.id).await.unwrap();
        assert!(store.unsynced_operations().await.unwrap().is_empty());
        assert_eq!(store.operations().await.unwrap().len(), 1);

        store.clear_synced().await.unwrap();
        assert!(store.operations().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rewrite_task_id_touches_task_and_queue() {
        let db = setup().await;
        let store = LibSqlTaskStore::new(db.connection());

        let task = sample_task("renamed");
        let temp_id = task.id.clone();
        store.put_task(&task).await.unwrap();
        store
            .enqueue(&SyncOperation::update(
                &temp_id,
                &TaskPatch {
                    completed: Some(true),
                    ..TaskPatch::default()
                },
                1,
            ))
            .await
            .unwrap();

        let server_id = TaskId::from("srv-42");
        store.rewrite_task_id(&temp_id, &server_id).await.unwrap();

        assert!(store.task(&temp_id).await.unwrap().is_none());
        assert!(store.task(&server_id).await.unwrap().is_some());
        let ops = store.unsynced_operations().await.unwrap();
        assert_eq!(ops[0].task_id, server_id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_conflict_roundtrip_and_take() {
        let db = setup().await;
        let store = LibSqlTaskStore::new(db.connection());

        let local = sample_task("mine");
        let mut remote = local.clone();
        remote.title = "theirs".to_string();
        remote.version = 3;

        let conflict = SyncConflict::new(local, remote);
        store.put_conflict(&conflict).await.unwrap();
        assert_eq!(store.conflicts().await.unwrap().len(), 1);

        let taken = store.take_conflict(&conflict.task_id).await.unwrap().unwrap();
        assert_eq!(taken, conflict);
        assert!(store.take_conflict(&conflict.task_id).await.unwrap().is_none());
        assert!(store.conflicts().await.unwrap().is_empty());
    }
}
