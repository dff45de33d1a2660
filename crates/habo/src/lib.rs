//! HABO marketplace event layer.
//!
//! Requesters publish requests, experts publish expertise listings, and both are
//! discovered through tag facets on Nostr relays. This crate provides:
//! - [`codec`]: typed records to and from the flat tag list
//! - [`facet`]: UI selections to relay filters
//! - [`refine`]: client-side search over fetched records
//! - [`cache`]: selection-keyed staleness cache
//! - [`feed`]: cached, bounded queries and last-selection-wins display state
//! - [`publish`]: form validation, encoding and broadcast
//!
//! # Example
//!
//! ```rust,no_run
//! use habo::{FacetSelection, HaboConfig, Marketplace, Request};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let market = Marketplace::from_config(HaboConfig::default())?;
//!     let page = market
//!         .query::<Request>(&FacetSelection::parse("podcast"), CancellationToken::new())
//!         .await;
//!
//!     if let Some(page) = page {
//!         for decoded in page.refine("custody") {
//!             println!("{}", decoded.record.title);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod facet;
pub mod feed;
pub mod publish;
pub mod refine;

pub use cache::{CachedQuery, Clock, ManualClock, QueryCache, SystemClock};
pub use codec::{
    Category, Decoded, Encoded, ExpertiseListing, ListingSchema, Request, TagCodec,
};
pub use config::HaboConfig;
pub use error::{ConfigError, HaboError, PublishError, Result};
pub use facet::{FacetSelection, RecordKind, build_filter, query_filters};
pub use feed::{Feed, FeedSnapshot, MarketRecord, Marketplace, Page};
pub use publish::{
    Composer, EventSubmitter, Form, ListingForm, PublishOutcome, RelaySubmitter, RequestForm,
    Signer,
};
pub use refine::{EmptyState, Searchable, refine};
