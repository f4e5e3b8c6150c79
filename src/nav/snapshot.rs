use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::state::NavState;

/// A serializable copy of the navigator's tables.
///
/// Snapshots are taken verbatim; validation happens when one is restored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Bottom first; the last entry is the active context.
    pub stack: Vec<String>,
    #[serde(default)]
    pub histories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub states: BTreeMap<String, NavState>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
