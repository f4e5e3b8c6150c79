//! Hierarchical navigation: context stack, back-history and cursor state.
//!
//! The [`Navigator`] is a plain state machine. [`attach`] makes it one more
//! bus participant: it subscribes to the inbound `nav.*` requests, decodes
//! them at the boundary and publishes whatever the navigator produced.

pub mod command;
pub mod id;
pub mod machine;
pub mod snapshot;
pub mod state;
pub mod topics;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;

use crate::error::BusError;
use crate::events::payload::{Diagnostic, Level, Payload};
use crate::events::{Event, EventBus};

pub use command::NavCommand;
pub use machine::Navigator;
pub use snapshot::Snapshot;
pub use state::{HistoryPolicy, Movement, NavState};

/// Bus owner name for the navigator's subscriptions.
pub const OWNER: &str = "nav";

/// Subscribe `navigator` to every inbound navigation request on `bus`.
pub fn attach(bus: &EventBus, navigator: &Rc<RefCell<Navigator>>) -> Result<(), BusError> {
    bus.register(OWNER)?;
    for topic in &topics::INBOUND {
        let navigator = Rc::clone(navigator);
        bus.subscribe(topic.as_str(), OWNER, move |bus, event| {
            handle(bus, &navigator, event)
        })?;
    }
    tracing::debug!(topics = topics::INBOUND.len(), "navigator attached");
    Ok(())
}

/// Drop every navigator subscription. Returns how many were removed.
pub fn detach(bus: &EventBus) -> usize {
    bus.cleanup(OWNER)
}

fn handle(bus: &EventBus, navigator: &RefCell<Navigator>, event: &Event) -> anyhow::Result<()> {
    let emitted = match NavCommand::from_event(event) {
        Ok(command) => {
            let mut navigator = navigator
                .try_borrow_mut()
                .map_err(|_| anyhow!("navigator busy, dropped re-entrant {}", event.name))?;
            navigator.apply(command)
        }
        Err(err) => {
            tracing::warn!(error = %err, "request rejected");
            vec![diagnostic_event(Level::Warn, err.to_string())]
        }
    };

    for out in &emitted {
        bus.dispatch(out);
    }
    Ok(())
}

/// A `log.<level>` event attributed to the navigator.
pub fn diagnostic_event(level: Level, message: String) -> Event {
    Event::new(
        topics::log_topic(level),
        Payload::Diagnostic(Diagnostic {
            level,
            source: OWNER.to_string(),
            message,
        }),
    )
}
