use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};

use super::SessionStore;
use crate::nav::Snapshot;

/// SQLite-backed session store. Shares a database file with
/// [`Config`](crate::config::Config).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open session database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                name     TEXT PRIMARY KEY,
                saved_at TEXT NOT NULL DEFAULT (datetime('now')),
                snapshot TEXT NOT NULL
            );",
        )
        .context("failed to create sessions table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("session database lock poisoned"))
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn save(&self, name: &str, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (name, snapshot) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET
                snapshot = excluded.snapshot,
                saved_at = datetime('now')",
            [name, json.as_str()],
        )?;
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<Snapshot>> {
        let json: Option<String> = {
            let conn = self.conn()?;
            conn.query_row(
                "SELECT snapshot FROM sessions WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?
        };
        json.map(|json| {
            serde_json::from_str(&json)
                .with_context(|| format!("session {name:?} is not a valid snapshot"))
        })
        .transpose()
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM sessions WHERE name = ?1", [name])?;
        Ok(removed > 0)
    }

    async fn names(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT name FROM sessions ORDER BY saved_at DESC, name ASC")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
