#![allow(dead_code)]

use async_trait::async_trait;
use habo::{HaboConfig, PublishError, Signer, TagCodec};
use nostr::{Event, EventTemplate, get_event_hash};
use nostr_client::{MemoryRelay, RelayPool, RelaySource};
use std::sync::Arc;

pub const ALICE: &str = "3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d";
pub const BOB: &str = "82341f882b6eabcd2ba7f1ef90aad961cf074af15b9ef44a09f9d2a8fbfbe6a2";

/// Signer that computes real NIP-01 ids and a placeholder signature.
pub struct TestSigner {
    pubkey: String,
}

impl TestSigner {
    pub fn new(pubkey: &str) -> Self {
        Self {
            pubkey: pubkey.to_string(),
        }
    }
}

#[async_trait]
impl Signer for TestSigner {
    fn public_key(&self) -> &str {
        &self.pubkey
    }

    async fn sign(&self, template: EventTemplate) -> Result<Event, PublishError> {
        Ok(sign_template(template, &self.pubkey))
    }
}

/// Signer that always refuses.
pub struct DecliningSigner;

#[async_trait]
impl Signer for DecliningSigner {
    fn public_key(&self) -> &str {
        ALICE
    }

    async fn sign(&self, _template: EventTemplate) -> Result<Event, PublishError> {
        Err(PublishError::Signing("user declined".to_string()))
    }
}

pub fn sign_template(template: EventTemplate, pubkey: &str) -> Event {
    let unsigned = template.into_unsigned(pubkey);
    let id = get_event_hash(&unsigned).unwrap();
    Event {
        id,
        pubkey: unsigned.pubkey,
        created_at: unsigned.created_at,
        kind: unsigned.kind,
        tags: unsigned.tags,
        content: unsigned.content,
        sig: "0".repeat(128),
    }
}

/// Encode and sign a record as `author` at `created_at`.
pub fn signed<T: TagCodec>(record: &T, author: &str, created_at: u64) -> Event {
    sign_template(record.encode(author).into_template(created_at), author)
}

/// Bare event with a chosen id.
pub fn raw_event(id: &str, kind: u16, created_at: u64, tags: Vec<Vec<String>>) -> Event {
    Event {
        id: id.to_string(),
        pubkey: ALICE.to_string(),
        created_at,
        kind,
        tags,
        content: String::new(),
        sig: String::new(),
    }
}

pub fn relay(name: &str, events: Vec<Event>) -> Arc<MemoryRelay> {
    Arc::new(MemoryRelay::with_events(format!("memory://{}", name), events))
}

pub fn pool_of(relays: &[&Arc<MemoryRelay>]) -> RelayPool {
    RelayPool::with_relays(
        relays
            .iter()
            .map(|r| Arc::clone(*r) as Arc<dyn RelaySource>)
            .collect(),
    )
}

pub fn test_config() -> HaboConfig {
    HaboConfig {
        relays: Vec::new(),
        query_timeout_ms: 1000,
        ..Default::default()
    }
}
