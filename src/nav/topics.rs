//! Event names consumed and produced by the navigator.

use crate::events::EventName;
use crate::events::payload::Level;

pub const UP: EventName = EventName::from_static("nav.up");
pub const DOWN: EventName = EventName::from_static("nav.down");
pub const LEFT: EventName = EventName::from_static("nav.left");
pub const RIGHT: EventName = EventName::from_static("nav.right");
pub const BACK: EventName = EventName::from_static("nav.back");
pub const SELECT: EventName = EventName::from_static("nav.select");
pub const MULTISELECT: EventName = EventName::from_static("nav.multiselect");
pub const NAVIGATE_TO: EventName = EventName::from_static("nav.navigate_to");
pub const CONTEXT_PUSH: EventName = EventName::from_static("nav.context_push");
pub const CONTEXT_POP: EventName = EventName::from_static("nav.context_pop");
pub const CONTEXT_CLEANUP: EventName = EventName::from_static("nav.context_cleanup");
pub const SET_STATE: EventName = EventName::from_static("nav.set_state");

pub const POS_CHANGED: EventName = EventName::from_static("nav.pos_changed");
pub const NAVIGATED_TO: EventName = EventName::from_static("nav.navigated_to");
pub const CONTEXT_PUSHED: EventName = EventName::from_static("nav.context_pushed");
pub const CONTEXT_POPPED: EventName = EventName::from_static("nav.context_popped");
pub const CONTEXT_CLEANED: EventName = EventName::from_static("nav.context_cleaned");
pub const SELECTED: EventName = EventName::from_static("nav.selected");
pub const MULTISELECTED: EventName = EventName::from_static("nav.multiselected");
pub const STATE_CORRUPTED: EventName = EventName::from_static("nav.state_corrupted");
pub const RESTORED: EventName = EventName::from_static("nav.restored");

/// Requests the navigator subscribes to.
pub const INBOUND: [EventName; 12] = [
    UP,
    DOWN,
    LEFT,
    RIGHT,
    BACK,
    SELECT,
    MULTISELECT,
    NAVIGATE_TO,
    CONTEXT_PUSH,
    CONTEXT_POP,
    CONTEXT_CLEANUP,
    SET_STATE,
];

/// Notifications the navigator publishes.
pub const OUTBOUND: [EventName; 9] = [
    POS_CHANGED,
    NAVIGATED_TO,
    CONTEXT_PUSHED,
    CONTEXT_POPPED,
    CONTEXT_CLEANED,
    SELECTED,
    MULTISELECTED,
    STATE_CORRUPTED,
    RESTORED,
];

/// Namespace for diagnostics, one name per level (`log.warn`, ...).
pub const LOG_NAMESPACE: &str = "log";

pub fn log_topic(level: Level) -> EventName {
    match level {
        Level::Debug => EventName::from_static("log.debug"),
        Level::Info => EventName::from_static("log.info"),
        Level::Warn => EventName::from_static("log.warn"),
        Level::Error => EventName::from_static("log.error"),
    }
}
