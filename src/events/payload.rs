//! Payload shapes for the canonical event surface.
//!
//! Every event carries one [`Payload`] variant. Collaborators that build
//! payloads from untyped sources (key maps, scripts, the REPL) use
//! [`Payload::Json`]; receivers decode it against the struct they expect and
//! reject it when the shape does not match.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Empty,
    Context(ContextRequest),
    Navigate(NavigateRequest),
    SetState(SetStateRequest),
    PositionChanged(PositionChanged),
    NavigatedTo(NavigatedTo),
    ContextChanged(ContextChanged),
    Selected(Selection),
    StateCorrupted(StateCorrupted),
    Diagnostic(Diagnostic),
    Json(serde_json::Value),
}

impl Payload {
    /// Short variant name, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Empty => "empty",
            Payload::Context(_) => "context",
            Payload::Navigate(_) => "navigate",
            Payload::SetState(_) => "set_state",
            Payload::PositionChanged(_) => "position_changed",
            Payload::NavigatedTo(_) => "navigated_to",
            Payload::ContextChanged(_) => "context_changed",
            Payload::Selected(_) => "selected",
            Payload::StateCorrupted(_) => "state_corrupted",
            Payload::Diagnostic(_) => "diagnostic",
            Payload::Json(_) => "json",
        }
    }
}

/// `{ctx_id}` for push, pop and cleanup requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRequest {
    pub ctx_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub ctx_id: String,
    pub nav_id: String,
    #[serde(default = "default_columns")]
    pub columns: i64,
    /// `0` means "no preference": keep the previous cursor if it still fits.
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub total_items: i64,
}

fn default_columns() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStateRequest {
    pub ctx_id: String,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionChanged {
    pub ctx_id: String,
    pub position: i64,
    pub old_position: i64,
}

/// What caused a `navigated_to` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    NavigateTo,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigatedTo {
    pub ctx_id: String,
    pub nav_id: String,
    pub columns: i64,
    pub position: i64,
    pub total_items: i64,
    pub trigger: Trigger,
}

/// Context stack transition. Either side is `None` when the stack was or
/// became empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextChanged {
    pub old_ctx: Option<String>,
    pub new_ctx: Option<String>,
}

/// `nav_id` here is the location only; the source prefix is stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub ctx_id: String,
    pub nav_id: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCorrupted {
    pub nav_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    pub source: String,
    pub message: String,
}
