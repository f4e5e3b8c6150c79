//! Compound `"<prefix>://<location>"` identifiers.
//!
//! The prefix names the content source (an adapter namespace such as
//! `jellyfin`), the location is whatever that source uses to address an item.
//! Only the first `://` separates the two, so locations may contain URLs.

use serde::{Deserialize, Serialize};

pub const SEPARATOR: &str = "://";

/// The two halves of a decoded identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavPath {
    pub prefix: String,
    pub location: String,
}

pub fn encode(prefix: &str, location: &str) -> String {
    format!("{prefix}{SEPARATOR}{location}")
}

/// Split on the first separator. Without one, both halves are empty.
pub fn decode(id: &str) -> NavPath {
    match id.split_once(SEPARATOR) {
        Some((prefix, location)) => NavPath {
            prefix: prefix.to_string(),
            location: location.to_string(),
        },
        None => NavPath::default(),
    }
}

/// The part of `id` shown to consumers of selection events: the location
/// when `id` is compound, the bare id otherwise.
pub fn display_location(id: &str) -> &str {
    id.split_once(SEPARATOR)
        .map_or(id, |(_, location)| location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_joins_with_separator() {
        assert_eq!(encode("jellyfin", "abc123"), "jellyfin://abc123");
    }

    #[test]
    fn decode_splits_prefix_and_location() {
        assert_eq!(
            decode("jellyfin://abc123"),
            NavPath {
                prefix: "jellyfin".to_string(),
                location: "abc123".to_string(),
            }
        );
    }

    #[test]
    fn decode_without_separator_is_empty() {
        assert_eq!(decode(""), NavPath::default());
        assert_eq!(decode("no-separator"), NavPath::default());
    }

    #[test]
    fn only_first_separator_counts() {
        let path = decode("web://https://example.com/a");
        assert_eq!(path.prefix, "web");
        assert_eq!(path.location, "https://example.com/a");
        assert_eq!(encode(&path.prefix, &path.location), "web://https://example.com/a");
    }

    #[test]
    fn empty_halves_survive() {
        assert_eq!(decode("://x").prefix, "");
        assert_eq!(decode("://x").location, "x");
        assert_eq!(decode("src://").location, "");
    }

    #[test]
    fn display_location_strips_prefix_only_when_present() {
        assert_eq!(display_location("jellyfin://abc"), "abc");
        assert_eq!(display_location("root"), "root");
    }
}
