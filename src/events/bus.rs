//! Synchronous, re-entrant publish/subscribe registry.
//!
//! The bus is single-threaded: it lives on the host's input thread and every
//! [`publish`](EventBus::publish) runs all matching listeners before
//! returning. Listeners receive the bus itself, so they may publish,
//! subscribe or unsubscribe from inside a dispatch.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use super::{Event, EventName, Pattern, Payload};
use crate::error::BusError;

/// A listener callback. Returning `Err` (or panicking) is logged and does
/// not stop the dispatch.
pub type Callback = dyn Fn(&EventBus, &Event) -> anyhow::Result<()>;

/// Handle returned by [`EventBus::subscribe`]; identifies one callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Listener {
    id: SubscriptionId,
    owner: String,
    pattern: Pattern,
    callback: Box<Callback>,
    /// Cleared on removal so an in-flight dispatch skips it.
    live: Cell<bool>,
}

#[derive(Default)]
struct Registry {
    exact: HashMap<EventName, Vec<Rc<Listener>>>,
    namespaces: HashMap<String, Vec<Rc<Listener>>>,
    owners: HashMap<String, Vec<(SubscriptionId, Pattern)>>,
    next_id: u64,
}

impl Registry {
    fn table(&mut self, pattern: &Pattern) -> Option<&mut Vec<Rc<Listener>>> {
        match pattern {
            Pattern::Exact(name) => self.exact.get_mut(name),
            Pattern::Namespace(ns) => self.namespaces.get_mut(ns),
        }
    }

    /// Detach one listener by id. Tables are in id order (ids are handed
    /// out monotonically and only appended), so this is a binary search
    /// that never walks other owners' listeners.
    fn take(&mut self, pattern: &Pattern, id: SubscriptionId) -> Option<Rc<Listener>> {
        let listeners = self.table(pattern)?;
        let index = listeners
            .binary_search_by_key(&id, |listener| listener.id)
            .ok()?;
        Some(listeners.remove(index))
    }

    fn prune(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Exact(name) => {
                if self.exact.get(name).is_some_and(Vec::is_empty) {
                    self.exact.remove(name);
                }
            }
            Pattern::Namespace(ns) => {
                if self.namespaces.get(ns).is_some_and(Vec::is_empty) {
                    self.namespaces.remove(ns);
                }
            }
        }
    }

    /// Remove listeners under `pattern` accepted by `pred`, keeping the
    /// owner buckets in step.
    fn remove_where(
        &mut self,
        pattern: &Pattern,
        pred: impl Fn(&Listener) -> bool,
    ) -> Vec<Rc<Listener>> {
        let Some(listeners) = self.table(pattern) else {
            return Vec::new();
        };
        let (removed, kept): (Vec<_>, Vec<_>) =
            listeners.drain(..).partition(|listener| pred(listener));
        *listeners = kept;
        self.prune(pattern);

        for listener in &removed {
            listener.live.set(false);
            if let Some(bucket) = self.owners.get_mut(&listener.owner) {
                bucket.retain(|(id, _)| *id != listener.id);
            }
        }
        removed
    }

    /// Listeners for `name`: exact matches first, then namespace matches,
    /// each group in subscription order.
    fn matching(&self, name: &EventName) -> Vec<Rc<Listener>> {
        let mut matched = self.exact.get(name).cloned().unwrap_or_default();
        let mut wildcard: Vec<Rc<Listener>> = name
            .namespaces()
            .filter_map(|ns| self.namespaces.get(ns))
            .flatten()
            .cloned()
            .collect();
        wildcard.sort_by_key(|listener| listener.id);
        matched.extend(wildcard);
        debug_assert!(matched.iter().all(|listener| listener.pattern.matches(name)));
        matched
    }
}

/// The application-wide event bus. Create one at the root and hand out
/// references (or an `Rc`) to every collaborator.
#[derive(Default)]
pub struct EventBus {
    registry: RefCell<Registry>,
    dispatched: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tracking bucket for `owner`. Idempotent.
    pub fn register(&self, owner: &str) -> Result<(), BusError> {
        if owner.is_empty() {
            return Err(BusError::InvalidOwner);
        }
        self.registry
            .borrow_mut()
            .owners
            .entry(owner.to_string())
            .or_default();
        Ok(())
    }

    /// Listen to an exact name (`"nav.back"`) or a namespace (`"nav.*"`).
    pub fn subscribe<F>(
        &self,
        pattern: &str,
        owner: &str,
        callback: F,
    ) -> Result<SubscriptionId, BusError>
    where
        F: Fn(&EventBus, &Event) -> anyhow::Result<()> + 'static,
    {
        let pattern = Pattern::parse(pattern)?;
        if owner.is_empty() {
            return Err(BusError::InvalidOwner);
        }

        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        let listener = Rc::new(Listener {
            id,
            owner: owner.to_string(),
            pattern: pattern.clone(),
            callback: Box::new(callback),
            live: Cell::new(true),
        });

        match &pattern {
            Pattern::Exact(name) => registry.exact.entry(name.clone()).or_default().push(listener),
            Pattern::Namespace(ns) => registry
                .namespaces
                .entry(ns.clone())
                .or_default()
                .push(listener),
        }
        registry
            .owners
            .entry(owner.to_string())
            .or_default()
            .push((id, pattern.clone()));

        tracing::trace!(%pattern, owner, ?id, "subscribed");
        Ok(id)
    }

    /// Remove listeners under `pattern`, filtered by subscription id, owner,
    /// or both. With neither filter every listener under `pattern` goes.
    /// Returns how many were removed.
    pub fn unsubscribe(
        &self,
        pattern: &str,
        id: Option<SubscriptionId>,
        owner: Option<&str>,
    ) -> Result<usize, BusError> {
        let pattern = Pattern::parse(pattern)?;
        let removed = self.registry.borrow_mut().remove_where(&pattern, |listener| {
            id.is_none_or(|id| listener.id == id)
                && owner.is_none_or(|owner| listener.owner == owner)
        });
        Ok(removed.len())
    }

    /// Remove every listener registered by `owner` and forget the owner.
    /// Only that owner's bucket is walked.
    pub fn cleanup(&self, owner: &str) -> usize {
        let mut registry = self.registry.borrow_mut();
        let Some(bucket) = registry.owners.remove(owner) else {
            return 0;
        };

        let mut removed = 0;
        for (id, pattern) in bucket {
            if let Some(listener) = registry.take(&pattern, id) {
                listener.live.set(false);
                removed += 1;
            }
            registry.prune(&pattern);
        }
        tracing::debug!(owner, removed, "owner cleaned up");
        removed
    }

    /// Publish `payload` under `name`. Returns the number of listener
    /// invocations attempted; an invalid name dispatches nothing.
    pub fn publish(&self, name: &str, payload: Payload) -> usize {
        match EventName::parse(name) {
            Ok(name) => self.dispatch(&Event::new(name, payload)),
            Err(err) => {
                tracing::warn!(error = %err, "publish rejected");
                0
            }
        }
    }

    /// Deliver an already-built event.
    ///
    /// The matching listeners are snapshotted first: listeners added during
    /// the dispatch wait for the next publish, listeners removed during it
    /// are skipped.
    pub fn dispatch(&self, event: &Event) -> usize {
        let snapshot = self.registry.borrow().matching(&event.name);

        let mut attempted = 0;
        for listener in snapshot {
            if !listener.live.get() {
                continue;
            }
            attempted += 1;
            self.dispatched.set(self.dispatched.get() + 1);

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (listener.callback)(self, event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::error!(
                    event = %event.name,
                    owner = %listener.owner,
                    error = %format!("{err:#}"),
                    "listener failed"
                ),
                Err(panic) => tracing::error!(
                    event = %event.name,
                    owner = %listener.owner,
                    panic = panic_message(panic.as_ref()),
                    "listener panicked"
                ),
            }
        }
        attempted
    }

    /// Whether publishing `name` would reach at least one listener.
    pub fn has_subscribers(&self, name: &str) -> bool {
        let Ok(name) = EventName::parse(name) else {
            return false;
        };
        let registry = self.registry.borrow();
        registry.exact.contains_key(&name)
            || name.namespaces().any(|ns| registry.namespaces.contains_key(ns))
    }

    /// Total listeners currently registered.
    pub fn listener_count(&self) -> usize {
        let registry = self.registry.borrow();
        registry.exact.values().map(Vec::len).sum::<usize>()
            + registry.namespaces.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_registered(&self, owner: &str) -> bool {
        self.registry.borrow().owners.contains_key(owner)
    }

    /// Listener invocations attempted over the bus lifetime.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.get()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("EventBus")
            .field("exact", &registry.exact.len())
            .field("namespaces", &registry.namespaces.len())
            .field("owners", &registry.owners.len())
            .field("dispatched", &self.dispatched.get())
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Box<dyn Fn(&EventBus, &Event) -> anyhow::Result<()>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |tag: &'static str| {
            let sink = Rc::clone(&sink);
            Box::new(move |_: &EventBus, _: &Event| {
                sink.borrow_mut().push(tag.to_string());
                Ok(())
            }) as Box<dyn Fn(&EventBus, &Event) -> anyhow::Result<()>>
        };
        (log, make)
    }

    #[test]
    fn publish_without_listeners_returns_zero() {
        let bus = EventBus::new();
        assert_eq!(bus.publish("nav.up", Payload::Empty), 0);
    }

    #[test]
    fn exact_listeners_run_in_subscription_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("a.b", "x", make("first")).unwrap();
        bus.subscribe("a.b", "y", make("second")).unwrap();

        assert_eq!(bus.publish("a.b", Payload::Empty), 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn exact_before_wildcard_regardless_of_subscription_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("a.*", "x", make("wild")).unwrap();
        bus.subscribe("a.b", "x", make("exact")).unwrap();

        bus.publish("a.b", Payload::Empty);
        assert_eq!(*log.borrow(), vec!["exact", "wild"]);
    }

    #[test]
    fn wildcards_across_namespaces_keep_subscription_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("a.b.*", "x", make("inner")).unwrap();
        bus.subscribe("a.*", "x", make("outer")).unwrap();
        bus.subscribe("a.b.*", "x", make("inner2")).unwrap();

        bus.publish("a.b.c", Payload::Empty);
        assert_eq!(*log.borrow(), vec!["inner", "outer", "inner2"]);
    }

    #[test]
    fn wildcard_needs_dot_boundary() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("foo.*", "x", make("foo")).unwrap();

        assert_eq!(bus.publish("foo", Payload::Empty), 0);
        assert_eq!(bus.publish("foobar.baz", Payload::Empty), 0);
        assert_eq!(bus.publish("foo.bar.baz", Payload::Empty), 1);
        assert_eq!(*log.borrow(), vec!["foo"]);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let bus = EventBus::new();
        let err = bus.subscribe("bad..name", "x", |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, BusError::InvalidPattern(_)));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn empty_owner_is_rejected() {
        let bus = EventBus::new();
        assert_eq!(
            bus.subscribe("a.b", "", |_, _| Ok(())).unwrap_err(),
            BusError::InvalidOwner
        );
        assert_eq!(bus.register(""), Err(BusError::InvalidOwner));
    }

    #[test]
    fn register_is_idempotent() {
        let bus = EventBus::new();
        bus.register("render").unwrap();
        bus.register("render").unwrap();
        assert!(bus.is_registered("render"));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn publish_with_invalid_name_dispatches_nothing() {
        let bus = EventBus::new();
        bus.subscribe("a.*", "x", |_, _| Ok(())).unwrap();
        assert_eq!(bus.publish("a.", Payload::Empty), 0);
        assert_eq!(bus.dispatched(), 0);
    }

    #[test]
    fn failing_listener_does_not_stop_dispatch() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("a.b", "x", |_, _| anyhow::bail!("boom")).unwrap();
        bus.subscribe("a.b", "y", make("after")).unwrap();

        assert_eq!(bus.publish("a.b", Payload::Empty), 2);
        assert_eq!(*log.borrow(), vec!["after"]);
    }

    #[test]
    fn panicking_listener_does_not_stop_dispatch() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("a.b", "x", |_, _| panic!("listener exploded")).unwrap();
        bus.subscribe("a.*", "y", make("after")).unwrap();

        assert_eq!(bus.publish("a.b", Payload::Empty), 2);
        assert_eq!(*log.borrow(), vec!["after"]);
    }

    #[test]
    fn unsubscribe_by_id_removes_only_that_listener() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        let first = bus.subscribe("a.b", "x", make("first")).unwrap();
        bus.subscribe("a.b", "x", make("second")).unwrap();

        assert_eq!(bus.unsubscribe("a.b", Some(first), None).unwrap(), 1);
        bus.publish("a.b", Payload::Empty);
        assert_eq!(*log.borrow(), vec!["second"]);
    }

    #[test]
    fn unsubscribe_by_owner() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("a.b", "x", make("x")).unwrap();
        bus.subscribe("a.b", "y", make("y")).unwrap();

        assert_eq!(bus.unsubscribe("a.b", None, Some("x")).unwrap(), 1);
        bus.publish("a.b", Payload::Empty);
        assert_eq!(*log.borrow(), vec!["y"]);
    }

    #[test]
    fn unsubscribe_without_filter_clears_exact_name_only() {
        let bus = EventBus::new();
        bus.subscribe("a.b", "x", |_, _| Ok(())).unwrap();
        bus.subscribe("a.b", "y", |_, _| Ok(())).unwrap();
        bus.subscribe("a.*", "y", |_, _| Ok(())).unwrap();

        assert_eq!(bus.unsubscribe("a.b", None, None).unwrap(), 2);
        assert_eq!(bus.listener_count(), 1);
        assert!(bus.has_subscribers("a.b"));
    }

    #[test]
    fn unsubscribe_with_mismatched_filters_removes_nothing() {
        let bus = EventBus::new();
        let id = bus.subscribe("a.b", "x", |_, _| Ok(())).unwrap();
        assert_eq!(bus.unsubscribe("a.b", Some(id), Some("y")).unwrap(), 0);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn cleanup_removes_exact_and_wildcard_for_owner_only() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("a.b", "x", make("x-exact")).unwrap();
        bus.subscribe("a.*", "x", make("x-wild")).unwrap();
        bus.subscribe("a.b", "y", make("y-exact")).unwrap();

        assert_eq!(bus.cleanup("x"), 2);
        assert!(!bus.is_registered("x"));
        bus.publish("a.b", Payload::Empty);
        assert_eq!(*log.borrow(), vec!["y-exact"]);
    }

    #[test]
    fn cleanup_of_interleaved_owners_keeps_survivor_order() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        for tag in ["keep-1", "keep-2", "keep-3"] {
            bus.subscribe("a.b", "x", make("x")).unwrap();
            bus.subscribe("a.b", "y", make(tag)).unwrap();
        }
        let gap = bus.subscribe("a.b", "y", make("gone")).unwrap();
        bus.subscribe("a.b", "x", make("x")).unwrap();
        bus.unsubscribe("a.b", Some(gap), None).unwrap();

        assert_eq!(bus.cleanup("x"), 4);
        bus.publish("a.b", Payload::Empty);
        assert_eq!(*log.borrow(), vec!["keep-1", "keep-2", "keep-3"]);
    }

    #[test]
    fn take_finds_listener_by_id_only_under_its_pattern() {
        let bus = EventBus::new();
        let id = bus.subscribe("a.b", "x", |_, _| Ok(())).unwrap();
        let mut registry = bus.registry.borrow_mut();
        let exact = Pattern::parse("a.b").unwrap();
        let wild = Pattern::parse("a.*").unwrap();
        assert!(registry.take(&wild, id).is_none());
        assert!(registry.take(&exact, id).is_some());
        assert!(registry.take(&exact, id).is_none());
    }

    #[test]
    fn cleanup_unknown_owner_is_noop() {
        let bus = EventBus::new();
        bus.subscribe("a.b", "x", |_, _| Ok(())).unwrap();
        assert_eq!(bus.cleanup("nobody"), 0);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn has_subscribers_checks_exact_and_wildcard() {
        let bus = EventBus::new();
        assert!(!bus.has_subscribers("a.b"));
        bus.subscribe("a.*", "x", |_, _| Ok(())).unwrap();
        assert!(bus.has_subscribers("a.b"));
        assert!(bus.has_subscribers("a.b.c"));
        assert!(!bus.has_subscribers("a"));
        assert!(!bus.has_subscribers("b.a"));
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("a.b", "remover", |bus, _| {
            bus.cleanup("victim");
            Ok(())
        })
        .unwrap();
        bus.subscribe("a.b", "victim", make("victim")).unwrap();

        assert_eq!(bus.publish("a.b", Payload::Empty), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn listener_added_mid_dispatch_fires_next_time() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        bus.subscribe("a.b", "adder", move |bus, _| {
            let sink = Rc::clone(&sink);
            bus.subscribe("a.b", "late", move |_, _| {
                sink.borrow_mut().push("late");
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

        assert_eq!(bus.publish("a.b", Payload::Empty), 1);
        assert!(log.borrow().is_empty());
        assert_eq!(bus.publish("a.b", Payload::Empty), 2);
        assert_eq!(*log.borrow(), vec!["late"]);
    }

    #[test]
    fn nested_publish_runs_to_completion() {
        let bus = EventBus::new();
        let (log, make) = recorder();
        bus.subscribe("outer.go", "x", |bus, _| {
            bus.publish("inner.go", Payload::Empty);
            Ok(())
        })
        .unwrap();
        bus.subscribe("inner.go", "x", make("inner")).unwrap();
        bus.subscribe("outer.go", "x", make("outer-after")).unwrap();

        bus.publish("outer.go", Payload::Empty);
        assert_eq!(*log.borrow(), vec!["inner", "outer-after"]);
        assert_eq!(bus.dispatched(), 3);
    }
}
