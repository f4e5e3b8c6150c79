//! Per-location cursor records and the movement arithmetic on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cursor and grid layout for one location.
///
/// Fields are signed so that a damaged record (restored from disk, written by
/// an older build) can be represented and detected rather than silently
/// clamped. [`NavState::is_valid`] is the structural invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavState {
    pub columns: i64,
    pub position: i64,
    pub total_items: i64,
}

impl NavState {
    pub fn new(columns: i64, position: i64, total_items: i64) -> Self {
        Self {
            columns,
            position,
            total_items,
        }
    }

    /// `columns >= 1`, `position >= 1`, `total_items >= 0`, and the cursor
    /// inside the list unless the list is empty.
    pub fn is_valid(&self) -> bool {
        self.columns >= 1
            && self.position >= 1
            && self.total_items >= 0
            && (self.total_items == 0 || self.position <= self.total_items)
    }

    /// Position after applying `movement`, or `None` when nothing moves
    /// (empty list, or a sideways step in a single-column list).
    pub fn moved(&self, movement: Movement) -> Option<i64> {
        if self.total_items == 0 {
            return None;
        }
        let delta = match movement {
            Movement::Up => -self.columns,
            Movement::Down => self.columns,
            Movement::Left if self.columns > 1 => -1,
            Movement::Right if self.columns > 1 => 1,
            Movement::Left | Movement::Right => return None,
        };
        Some(wrap(self.position, delta, self.total_items))
    }
}

/// 1-based wraparound: `((position - 1 + delta) mod total) + 1`.
///
/// Computed in `i128`; any `columns >= 1` is a legal stride, so the sum can
/// leave the `i64` range. The result is in `1..=total_items`.
pub fn wrap(position: i64, delta: i64, total_items: i64) -> i64 {
    let wrapped = (i128::from(position) - 1 + i128::from(delta))
        .rem_euclid(i128::from(total_items))
        + 1;
    wrapped as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
    Left,
    Right,
}

/// Whether re-navigating to the location already on top of a history adds
/// another entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Skip the append; `back` never lands on the same location twice.
    #[default]
    Dedup,
    /// Always append.
    Append,
}

impl FromStr for HistoryPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dedup" => Ok(HistoryPolicy::Dedup),
            "append" => Ok(HistoryPolicy::Append),
            other => anyhow::bail!("unknown history policy {other:?} (expected dedup or append)"),
        }
    }
}

impl fmt::Display for HistoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HistoryPolicy::Dedup => "dedup",
            HistoryPolicy::Append => "append",
        })
    }
}
