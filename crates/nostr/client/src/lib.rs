//! Nostr relay client for the HABO marketplace.
//!
//! This crate provides:
//! - NIP-01 filters and relay protocol messages
//! - Point-in-time queries over one or many relays, bounded by a timeout and
//!   abandonable through a cancellation token
//! - Merging of relay output (dedup by id, latest replaceable/addressable version wins,
//!   newest first)
//! - Event broadcast with per-relay confirmation
//! - An in-memory relay for offline use and tests
//!
//! # Example
//!
//! ```rust,no_run
//! use nostr_client::{Filter, QueryOptions, RelayConfig, RelayPool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nostr_client::ClientError> {
//!     let pool = RelayPool::from_urls(&["wss://relay.damus.io", "wss://nos.lol"], RelayConfig::default())?;
//!
//!     let filter = Filter::new().kinds([9802]).tag("t", ["news"]).limit(50);
//!     let result = pool.query(vec![filter], QueryOptions::default()).await;
//!
//!     for event in result.events {
//!         println!("{} {}", event.created_at, event.id);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod filter;
mod memory;
mod merge;
mod message;
mod pool;
mod relay;
mod subscription;

pub use error::{ClientError, Result};
pub use filter::Filter;
pub use memory::{MemoryRelay, MemoryRelayBehavior};
pub use merge::merge_events;
pub use message::{ClientMessage, MessageError, RelayMessage};
pub use pool::{
    DEFAULT_QUERY_TIMEOUT, QueryOptions, QueryResult, QueryStatus, RelayPool, RelayPublishResult,
};
pub use relay::{PublishConfirmation, RelayConfig, RelayConnection, RelaySource};
pub use subscription::generate_subscription_id;

/// Public relays used when no relay list is configured.
pub const DEFAULT_RELAYS: &[&str] = &[
    "wss://relay.damus.io",
    "wss://nos.lol",
    "wss://relay.nostr.band",
    "wss://relay.snort.social",
];
