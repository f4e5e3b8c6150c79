//! Key-value configuration storage backed by SQLite.
//!
//! Shares a database with [`SqliteStore`](crate::store::sqlite::SqliteStore);
//! pass the same path to both. [`Settings`] is the typed view the driver
//! reads at startup.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use crate::consts::DEFAULT_SESSION;
use crate::nav::HistoryPolicy;

pub const KEY_HISTORY_POLICY: &str = "history_policy";
pub const KEY_AUTOSAVE: &str = "autosave";
pub const KEY_SESSION: &str = "session";

/// Every key [`Settings`] understands.
pub const KNOWN_KEYS: &[&str] = &[KEY_HISTORY_POLICY, KEY_AUTOSAVE, KEY_SESSION];

/// Persistent key-value configuration store.
pub struct Config {
    conn: Mutex<Connection>,
}

impl Config {
    /// Open or create the config table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open config database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .context("failed to create config table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("config database lock poisoned"))
    }

    /// Get a config value by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a config value (upsert).
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a config key.
    pub fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM config WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// Typed startup settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub history_policy: HistoryPolicy,
    /// Save the navigator on exit and restore it on start.
    pub autosave: bool,
    /// Name the snapshot is stored under.
    pub session: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_policy: HistoryPolicy::default(),
            autosave: true,
            session: DEFAULT_SESSION.to_string(),
        }
    }
}

impl Settings {
    /// Read stored settings, falling back to defaults for missing keys.
    pub fn load(config: &Config) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(policy) = config.get(KEY_HISTORY_POLICY)? {
            settings.history_policy = policy
                .parse()
                .with_context(|| format!("bad {KEY_HISTORY_POLICY} in config"))?;
        }
        if let Some(autosave) = config.get(KEY_AUTOSAVE)? {
            settings.autosave = parse_bool(&autosave)
                .with_context(|| format!("bad {KEY_AUTOSAVE} in config"))?;
        }
        if let Some(session) = config.get(KEY_SESSION)? {
            anyhow::ensure!(!session.trim().is_empty(), "{KEY_SESSION} must not be empty");
            settings.session = session;
        }
        Ok(settings)
    }

    /// Validate `value` for `key` before it is written to the store.
    pub fn check(key: &str, value: &str) -> Result<()> {
        match key {
            KEY_HISTORY_POLICY => value.parse::<HistoryPolicy>().map(|_| ()),
            KEY_AUTOSAVE => parse_bool(value).map(|_| ()),
            KEY_SESSION if value.trim().is_empty() => anyhow::bail!("{KEY_SESSION} must not be empty"),
            KEY_SESSION => Ok(()),
            other => anyhow::bail!(
                "unknown config key {other:?} (known: {})",
                KNOWN_KEYS.join(", ")
            ),
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => anyhow::bail!("expected true or false, got {other:?}"),
    }
}
