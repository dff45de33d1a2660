//! NIP-33: Parameterized Replaceable Events (addressable events).
//!
//! For kind `n` such that `30000 <= n < 40000`, events are addressable by their kind, pubkey,
//! and `d` tag value. For each unique combination only the latest event is logically current;
//! without a central store, clients reconstruct that at read time.

use crate::nip01::Event;
use crate::tags::first_tag_value;

/// Tag name for the d-identifier
pub const D_TAG: &str = "d";

/// Get the d tag value from an event.
///
/// Returns `None` if the event has no d tag.
pub fn get_d_tag(event: &Event) -> Option<String> {
    first_tag_value(&event.tags, D_TAG).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(tags: Vec<Vec<String>>) -> Event {
        Event {
            id: "id".to_string(),
            pubkey: "pk".to_string(),
            created_at: 1,
            kind: 30023,
            tags,
            content: String::new(),
            sig: String::new(),
        }
    }

    #[test]
    fn test_d_tag_first_wins() {
        let event = listing(vec![
            vec!["t".to_string(), "source".to_string()],
            vec!["d".to_string(), "habo-source-pk".to_string()],
            vec!["d".to_string(), "other".to_string()],
        ]);
        assert_eq!(get_d_tag(&event).as_deref(), Some("habo-source-pk"));
    }

    #[test]
    fn test_missing_d_tag() {
        assert_eq!(get_d_tag(&listing(vec![])), None);
    }
}
