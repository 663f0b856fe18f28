//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: task cache, outbox, and conflict journal
async fn migrate_v1(conn: &Connection) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement
    // separately inside one transaction.
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Materialized task collection
        "CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            user_id TEXT NOT NULL,
            version INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_tasks_updated ON tasks(updated_at DESC)",
        // Outbox of pending mutations, drained in timestamp order
        "CREATE TABLE IF NOT EXISTS sync_queue (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            task_id TEXT NOT NULL,
            payload TEXT NOT NULL,
            base_version INTEGER NOT NULL,
            timestamp TEXT NOT NULL,
            synced INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE INDEX IF NOT EXISTS idx_sync_queue_ts ON sync_queue(timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_sync_queue_synced ON sync_queue(synced)",
        // Unresolved conflicts, local and server snapshots as JSON
        "CREATE TABLE IF NOT EXISTS conflicts (
            task_id TEXT PRIMARY KEY,
            local_json TEXT NOT NULL,
            remote_json TEXT NOT NULL,
            detected_at TEXT NOT NULL
        )",
        // Record migration version
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    for statement in statements {
        conn.execute(statement, ()).await?;
    }

    conn.execute("COMMIT", ()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_migrations_are_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        run(db.connection()).await.unwrap();
        run(db.connection()).await.unwrap();

        let version = get_version(db.connection()).await.unwrap();
        assert_eq!(version, 1);
    }
}
