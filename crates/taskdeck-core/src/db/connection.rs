//! Database connection management

use crate::error::Result;
use libsql::{Builder, Connection};
use std::path::Path;

use super::migrations;

/// Wrapper for the local libSQL database holding the task cache and
/// the mutation outbox.
///
/// Opening may fail (unsupported environment, unwritable path); callers
/// treat that as fatal to offline capability and degrade to online-only
/// operation rather than pretending offline writes succeeded.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a local database at the given path, creating it if it
    /// doesn't exist. Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        let conn = db.connect()?;

        let database = Self { conn };
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        let database = Self { conn };
        database.configure().await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Configure `SQLite` for local durability and performance
    async fn configure(&self) -> Result<()> {
        // WAL keeps reads fast while the engine writes the outbox
        self.conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok(); // not supported on :memory:
        self.conn
            .execute("PRAGMA synchronous = NORMAL;", ())
            .await
            .ok();
        self.conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        Ok(())
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        migrations::run(&self.conn).await
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
