//! Decoupled event bus for cross-component communication.
//!
//! Components publish named events via [`EventBus::publish`] and subscribe
//! with [`EventBus::subscribe`]. Names are dot-namespaced (`"nav.back"`); a
//! subscription pattern ending in `.*` listens to a whole namespace.
//! Dispatch is synchronous and runs on the caller's thread.

pub mod bus;
pub mod payload;

use std::borrow::Cow;
use std::fmt;

use crate::error::BusError;

pub use bus::{EventBus, SubscriptionId};
pub use payload::Payload;

/// A validated, dot-namespaced event name such as `"nav.navigate_to"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventName(Cow<'static, str>);

impl EventName {
    /// Parse a runtime string. Segments must be non-empty and free of
    /// whitespace and `*`.
    pub fn parse(name: &str) -> Result<Self, BusError> {
        if is_valid_name(name) {
            Ok(Self(Cow::Owned(name.to_string())))
        } else {
            Err(BusError::InvalidEventName(name.to_string()))
        }
    }

    /// Wrap a compile-time topic constant. Validity of every constant in the
    /// crate is covered by tests.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace prefixes of this name, shortest first.
    /// `"a.b.c"` yields `"a"`, `"a.b"`.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        let name = self.as_str();
        name.match_indices('.').map(move |(i, _)| &name[..i])
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty() && !segment.contains(|c: char| c == '*' || c.is_whitespace())
        })
}

/// What a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// One exact event name.
    Exact(EventName),
    /// Every event strictly inside a namespace: `"foo"` matches `"foo.bar"`
    /// and `"foo.bar.baz"`, never `"foo"` or `"foobar.baz"`.
    Namespace(String),
}

impl Pattern {
    pub fn parse(pattern: &str) -> Result<Self, BusError> {
        match pattern.strip_suffix(".*") {
            Some(namespace) if is_valid_name(namespace) => {
                Ok(Pattern::Namespace(namespace.to_string()))
            }
            Some(_) => Err(BusError::InvalidPattern(pattern.to_string())),
            None => EventName::parse(pattern)
                .map(Pattern::Exact)
                .map_err(|_| BusError::InvalidPattern(pattern.to_string())),
        }
    }

    pub fn matches(&self, name: &EventName) -> bool {
        match self {
            Pattern::Exact(exact) => exact == name,
            Pattern::Namespace(ns) => name
                .as_str()
                .strip_prefix(ns.as_str())
                .is_some_and(|rest| rest.starts_with('.')),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(name) => write!(f, "{name}"),
            Pattern::Namespace(ns) => write!(f, "{ns}.*"),
        }
    }
}

/// A published event: its name plus a typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: EventName,
    pub payload: Payload,
}

impl Event {
    pub fn new(name: EventName, payload: Payload) -> Self {
        Self { name, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_names() {
        assert!(EventName::parse("nav.navigate_to").is_ok());
        assert!(EventName::parse("a.b.c").is_ok());
        assert!(EventName::parse("single").is_ok());
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["", ".", "a.", ".a", "a..b", "a.*", "a b", "nav.*.x"] {
            assert!(EventName::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn namespaces_are_shortest_first() {
        let name = EventName::parse("a.b.c").unwrap();
        assert_eq!(name.namespaces().collect::<Vec<_>>(), vec!["a", "a.b"]);
        let flat = EventName::parse("flat").unwrap();
        assert_eq!(flat.namespaces().count(), 0);
    }

    #[test]
    fn wildcard_pattern_parses_to_namespace() {
        assert_eq!(
            Pattern::parse("foo.*").unwrap(),
            Pattern::Namespace("foo".to_string())
        );
        assert_eq!(
            Pattern::parse("a.b.*").unwrap(),
            Pattern::Namespace("a.b".to_string())
        );
    }

    #[test]
    fn rejects_malformed_patterns() {
        for bad in ["", ".*", "*", "foo*", "foo.*.*", "a..b.*"] {
            assert!(Pattern::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn namespace_match_requires_dot_boundary() {
        let ns = Pattern::parse("foo.*").unwrap();
        let name = |s| EventName::parse(s).unwrap();
        assert!(ns.matches(&name("foo.bar")));
        assert!(ns.matches(&name("foo.bar.baz")));
        assert!(!ns.matches(&name("foo")));
        assert!(!ns.matches(&name("foobar.baz")));
    }

    #[test]
    fn pattern_display_round_trips() {
        assert_eq!(Pattern::parse("x.*").unwrap().to_string(), "x.*");
        assert_eq!(Pattern::parse("x.y").unwrap().to_string(), "x.y");
    }
}
