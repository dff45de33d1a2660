//! Merging raw relay output into a canonical result set.
//!
//! Relays may return the same event more than once, return several versions of a
//! replaceable event, and answer in any order. `merge_events` turns that into one
//! deterministic list:
//! - one entry per event id
//! - one entry per `(kind, pubkey)` for replaceable kinds (NIP-01)
//! - one entry per `(kind, pubkey, d)` for addressable kinds (NIP-33)
//! - newest first, ties broken by id ascending

use nostr::{Event, compare_events, get_d_tag, is_addressable_kind, is_replaceable_kind};
use std::collections::HashSet;

/// Logical identity of an event for "latest wins" purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Coordinate {
    Replaceable(u16, String),
    Addressable(u16, String, String),
}

fn coordinate(event: &Event) -> Option<Coordinate> {
    if is_replaceable_kind(event.kind) {
        Some(Coordinate::Replaceable(event.kind, event.pubkey.clone()))
    } else if is_addressable_kind(event.kind) {
        // A missing d tag is treated as the empty identifier.
        Some(Coordinate::Addressable(
            event.kind,
            event.pubkey.clone(),
            get_d_tag(event).unwrap_or_default(),
        ))
    } else {
        None
    }
}

/// Deduplicate, collapse superseded versions, and order a batch of events.
pub fn merge_events(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(compare_events);

    let mut seen_ids = HashSet::new();
    let mut seen_coordinates = HashSet::new();

    events.retain(|event| {
        if !seen_ids.insert(event.id.clone()) {
            return false;
        }
        match coordinate(event) {
            // Sorted newest first, so the first event at a coordinate wins.
            Some(coord) => seen_coordinates.insert(coord),
            None => true,
        }
    });

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(id: &str, pubkey: &str, kind: u16, created_at: u64, d: Option<&str>) -> Event {
        Event {
            id: id.to_string(),
            pubkey: pubkey.to_string(),
            created_at,
            kind,
            tags: d
                .map(|d| vec![vec!["d".to_string(), d.to_string()]])
                .unwrap_or_default(),
            content: String::new(),
            sig: String::new(),
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let a = event("a", "pk", 9802, 100, None);
        let b = event("b", "pk", 9802, 200, None);
        let merged = merge_events(vec![a.clone(), b, a]);
        assert_eq!(ids(&merged), vec!["b", "a"]);
    }

    #[test]
    fn test_ordering_ties_by_id() {
        let merged = merge_events(vec![
            event("b", "pk1", 9802, 100, None),
            event("a", "pk2", 9802, 300, None),
            event("c", "pk3", 9802, 100, None),
        ]);
        assert_eq!(ids(&merged), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_addressable_latest_wins() {
        let merged = merge_events(vec![
            event("old", "pk", 30023, 100, Some("habo-source-pk")),
            event("new", "pk", 30023, 200, Some("habo-source-pk")),
            event("other-d", "pk", 30023, 50, Some("article")),
            event("other-author", "pk2", 30023, 150, Some("habo-source-pk")),
        ]);
        assert_eq!(ids(&merged), vec!["new", "other-author", "other-d"]);
    }

    #[test]
    fn test_addressable_tie_keeps_smallest_id() {
        let merged = merge_events(vec![
            event("z", "pk", 30023, 100, Some("d")),
            event("m", "pk", 30023, 100, Some("d")),
        ]);
        assert_eq!(ids(&merged), vec!["m"]);
    }

    #[test]
    fn test_replaceable_latest_wins() {
        let merged = merge_events(vec![
            event("meta-1", "pk", 0, 100, None),
            event("meta-2", "pk", 0, 200, None),
        ]);
        assert_eq!(ids(&merged), vec!["meta-2"]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = vec![
            event("a", "pk", 30023, 100, Some("d")),
            event("b", "pk", 30023, 300, Some("d")),
            event("c", "pk", 9802, 200, None),
            event("c", "pk", 9802, 200, None),
        ];
        let once = merge_events(input);
        let twice = merge_events(once.clone());
        assert_eq!(once, twice);
    }
}
