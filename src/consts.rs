//! Project-wide constants.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Session name used when none is configured.
pub const DEFAULT_SESSION: &str = "default";

/// Log filter used when neither `RUST_LOG` nor `--log-filter` is set.
pub const DEFAULT_LOG_FILTER: &str = "waypoint=info";

/// Bus owner name for the interactive console.
pub const CONSOLE_OWNER: &str = "console";

/// Default database path: `~/.waypoint/waypoint.db`.
/// Single DB for config and saved sessions.
pub fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".waypoint").join("waypoint.db"))
}
