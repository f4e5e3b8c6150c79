//! Typed errors at the library boundaries.
//!
//! Application plumbing (config, persistence, CLI) uses `anyhow`; these enums
//! cover the bus and payload validation, where callers match on the cause.

use thiserror::Error;

/// Rejections raised by [`EventBus`](crate::events::EventBus) registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("invalid event name: {0:?}")]
    InvalidEventName(String),

    #[error("invalid subscription pattern: {0:?}")]
    InvalidPattern(String),

    #[error("invalid owner: owner names must be non-empty")]
    InvalidOwner,
}

/// Why an inbound event payload was refused.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("{topic}: not a navigation request")]
    UnknownTopic { topic: String },

    #[error("{topic}: expected {expected} payload, got {found}")]
    Mismatch {
        topic: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{topic}: malformed payload: {source}")]
    Schema {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{topic}: {reason}")]
    OutOfRange { topic: String, reason: String },
}
