//! Tag codec: typed marketplace records to and from the flat Nostr tag list.
//!
//! Every record type implements [`TagCodec`]. Encoding yields the `(kind, tags, content)`
//! triple handed to the signer. Decoding is total: missing or malformed fields fall
//! back to documented defaults so foreign events never break a listing page.
//!
//! Facet values that relays should filter on (request category, expertise areas) are
//! duplicated into lowercase `t` tags, since relays only index single-letter tags.

mod listing;
mod request;

pub use listing::{
    ExpertiseListing, ListingSchema, SUGGESTED_EXPERTISE, TOPIC_SOURCE, UNTITLED_SOURCE,
    expertise_label, identity_key,
};
pub use request::{Category, Request, UNTITLED_QUERY};

use nostr::{Event, EventTemplate, T_TAG, first_tag_value, has_tag, tag};

/// Kind for marketplace requests ("queries").
pub const KIND_HABO_REQUEST: u16 = 9802;

/// Kind for the legacy ephemeral source profile.
pub const KIND_HABO_SOURCE_PROFILE: u16 = 9803;

/// Kind for expertise listings (NIP-23 long-form, addressable).
pub const KIND_EXPERTISE_LISTING: u16 = nostr::KIND_LONG_FORM;

/// An encoded record, ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

impl Encoded {
    /// Turn into an event template stamped with `created_at`.
    pub fn into_template(self, created_at: u64) -> EventTemplate {
        EventTemplate {
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            created_at,
        }
    }
}

/// Bidirectional mapping between a record type and Nostr events.
pub trait TagCodec: Sized {
    /// Kind this record type is published under.
    const KIND: u16;

    /// Encode for publishing by `author` (hex pubkey).
    fn encode(&self, author: &str) -> Encoded;

    /// Decode an event. Never fails.
    fn decode(event: &Event) -> Self;

    /// Whether `event` belongs to this record type at all.
    fn accepts(event: &Event) -> bool {
        event.kind == Self::KIND
    }
}

/// A decoded record together with the event metadata it came from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Decoded<T> {
    pub id: String,
    pub author: String,
    pub created_at: u64,
    pub kind: u16,
    pub record: T,
}

impl<T: TagCodec> Decoded<T> {
    /// Decode a single event.
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            author: event.pubkey.clone(),
            created_at: event.created_at,
            kind: event.kind,
            record: T::decode(event),
        }
    }

    /// Decode every accepted event, preserving order and dropping foreign ones.
    pub fn decode_all(events: &[Event]) -> Vec<Self> {
        events
            .iter()
            .filter(|event| T::accepts(event))
            .map(Self::from_event)
            .collect()
    }
}

/// Normalize a facet value the way relays see it.
pub fn normalize_facet(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Push a `t` tag unless an identical one is already present.
pub(crate) fn push_facet(tags: &mut Vec<Vec<String>>, value: &str) {
    let value = normalize_facet(value);
    if value.is_empty() {
        return;
    }
    if !has_tag(tags, T_TAG, &value) {
        tags.push(tag(T_TAG, value));
    }
}

/// First non-blank value of a singular tag.
pub(crate) fn singular(event: &Event, name: &str) -> Option<String> {
    first_tag_value(&event.tags, name)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Drop blank optional inputs.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_facet_normalizes_and_dedupes() {
        let mut tags = vec![tag("title", "x")];
        push_facet(&mut tags, " Mining ");
        push_facet(&mut tags, "mining");
        push_facet(&mut tags, "   ");

        assert_eq!(tags, vec![tag("title", "x"), tag("t", "mining")]);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  @habo ")), Some("@habo".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
