//! Nostr protocol primitives for the HABO marketplace.
//!
//! This crate provides:
//! - NIP-01: Event structure, serialization, id hashing, kind classification, ordering
//! - NIP-33: d-tag lookup for addressable (parameterized replaceable) events
//! - Tag lookup helpers over the flat tag list
//!
//! Signing is delegated to an external signer; this crate never holds secret keys.

mod nip01;
mod nip33;
mod tags;

// NIP-01: Basic protocol
pub use nip01::{
    Event, EventTemplate, KIND_LONG_FORM, KindClassification, Nip01Error, UnsignedEvent,
    classify_kind, compare_events, get_event_hash, is_addressable_kind, is_replaceable_kind,
    serialize_event, sort_events, verify_event_id,
};

// NIP-33: Addressable events
pub use nip33::{D_TAG, get_d_tag};

// Tag helpers
pub use tags::{T_TAG, first_tag_value, has_tag, tag, tag_values};
