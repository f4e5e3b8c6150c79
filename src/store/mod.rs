//! Persistence for navigator snapshots, so a browsing session survives a
//! restart of the host player.

pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::nav::Snapshot;

/// Where named navigator snapshots live. Could be SQLite, a file, etc.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Save (or replace) the snapshot stored under `name`.
    async fn save(&self, name: &str, snapshot: &Snapshot) -> Result<()>;
    async fn load(&self, name: &str) -> Result<Option<Snapshot>>;
    /// Returns whether anything was removed.
    async fn remove(&self, name: &str) -> Result<bool>;
    /// Stored session names, most recently saved first.
    async fn names(&self) -> Result<Vec<String>>;
}
