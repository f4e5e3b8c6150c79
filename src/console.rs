//! Startup banner, live event echo and session summary display.

use std::cell::RefCell;

use crate::consts::CONSOLE_OWNER;
use crate::error::BusError;
use crate::events::payload::{Level, Payload, Trigger};
use crate::events::{Event, EventBus};
use crate::nav::{Navigator, topics};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub database: &'a str,
    pub session: &'a str,
    pub policy: &'a str,
    pub autosave: bool,
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    println!(
        r#"
   ╔═══════════════════════════════════════╗
   ║           W A Y P O I N T             ║
   ║    every screen remembers its place   ║
   ╚═══════════════════════════════════════╝

   version   {}
   database  {}
   session   {}
   history   {}
   autosave  {}

   type `help` for commands
"#,
        env!("CARGO_PKG_VERSION"),
        info.database,
        info.session,
        info.policy,
        if info.autosave { "on" } else { "off" },
    );
}

/// Echo navigator notifications and `info`+ diagnostics to stdout.
pub fn attach(bus: &EventBus) -> Result<(), BusError> {
    bus.register(CONSOLE_OWNER)?;
    for topic in &topics::OUTBOUND {
        bus.subscribe(topic.as_str(), CONSOLE_OWNER, |_, event| {
            println!("  · {}", describe(event));
            Ok(())
        })?;
    }
    let logs = format!("{}.*", topics::LOG_NAMESPACE);
    bus.subscribe(&logs, CONSOLE_OWNER, |_, event| {
        if let Payload::Diagnostic(diag) = &event.payload {
            if diag.level >= Level::Info {
                println!("  ! {}", describe(event));
            }
        }
        Ok(())
    })?;
    Ok(())
}

/// One-line human rendering of an event.
pub fn describe(event: &Event) -> String {
    let name = event.name.as_str();
    match &event.payload {
        Payload::Empty => name.to_string(),
        Payload::PositionChanged(p) => {
            format!("{name} {}: {} → {}", p.ctx_id, p.old_position, p.position)
        }
        Payload::NavigatedTo(n) => {
            let via = match n.trigger {
                Trigger::NavigateTo => "",
                Trigger::Back => " (back)",
            };
            format!(
                "{name} {}: {} @ {}/{}{via}",
                n.ctx_id, n.nav_id, n.position, n.total_items
            )
        }
        Payload::ContextChanged(c) => format!(
            "{name} {} → {}",
            c.old_ctx.as_deref().unwrap_or("-"),
            c.new_ctx.as_deref().unwrap_or("-")
        ),
        Payload::Selected(s) => format!("{name} {}: {} #{}", s.ctx_id, s.nav_id, s.position),
        Payload::StateCorrupted(s) => format!("{name} {}", s.nav_id),
        Payload::Diagnostic(d) => format!("[{}] {}: {}", d.level.as_str(), d.source, d.message),
        Payload::Context(c) => format!("{name} {}", c.ctx_id),
        Payload::Navigate(n) => format!("{name} {}: {}", n.ctx_id, n.nav_id),
        Payload::SetState(s) => match s.position {
            Some(position) => format!("{name} {} #{position}", s.ctx_id),
            None => format!("{name} {}", s.ctx_id),
        },
        Payload::Json(value) => format!("{name} {value}"),
    }
}

/// Print the session summary (bus traffic + farewell).
pub fn print_session_summary(bus: &EventBus, navigator: &RefCell<Navigator>) {
    let dispatched = bus.dispatched();
    if dispatched > 0 {
        let depth = navigator.borrow().depth();
        println!("session: {dispatched:>6} deliveries, {depth} open context(s)");
    }
    println!("goodbye.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::payload::{ContextChanged, Diagnostic, NavigatedTo, PositionChanged};

    #[test]
    fn print_banner_does_not_panic() {
        print_banner(&BannerInfo {
            database: ":memory:",
            session: "default",
            policy: "dedup",
            autosave: false,
        });
    }

    #[test]
    fn print_session_summary_quiet_bus() {
        // Should only print "goodbye." with no traffic line
        print_session_summary(&EventBus::new(), &RefCell::new(Navigator::default()));
    }

    #[test]
    fn attach_covers_outbound_and_logs() {
        let bus = EventBus::new();
        attach(&bus).unwrap();
        assert!(bus.is_registered(CONSOLE_OWNER));
        assert_eq!(bus.listener_count(), topics::OUTBOUND.len() + 1);
        assert!(bus.has_subscribers("log.error"));
        assert!(!bus.has_subscribers("nav.back"));
    }

    #[test]
    fn describe_navigation() {
        let event = Event::new(
            topics::NAVIGATED_TO,
            Payload::NavigatedTo(NavigatedTo {
                ctx_id: "text".to_string(),
                nav_id: "jellyfin://root".to_string(),
                columns: 1,
                position: 2,
                total_items: 10,
                trigger: Trigger::Back,
            }),
        );
        assert_eq!(
            describe(&event),
            "nav.navigated_to text: jellyfin://root @ 2/10 (back)"
        );
    }

    #[test]
    fn describe_context_and_position() {
        let pushed = Event::new(
            topics::CONTEXT_PUSHED,
            Payload::ContextChanged(ContextChanged {
                old_ctx: None,
                new_ctx: Some("text".to_string()),
            }),
        );
        assert_eq!(describe(&pushed), "nav.context_pushed - → text");

        let moved = Event::new(
            topics::POS_CHANGED,
            Payload::PositionChanged(PositionChanged {
                ctx_id: "text".to_string(),
                position: 1,
                old_position: 10,
            }),
        );
        assert_eq!(describe(&moved), "nav.pos_changed text: 10 → 1");
    }

    #[test]
    fn describe_diagnostic() {
        let event = Event::new(
            topics::log_topic(Level::Warn),
            Payload::Diagnostic(Diagnostic {
                level: Level::Warn,
                source: "nav".to_string(),
                message: "purged".to_string(),
            }),
        );
        assert_eq!(describe(&event), "[warn] nav: purged");
    }
}
