//! Read path: cached, bounded relay queries and last-selection-wins display state.
//!
//! [`Marketplace`] answers one selection at a time: cache first, then the relay pool
//! under the configured timeout. [`Feed`] sits on top for a page that switches facets:
//! each new selection cancels the one in flight, and a result only reaches the
//! displayed snapshot if its selection is still the latest.

use crate::cache::{CachedQuery, Clock, QueryCache, SystemClock};
use crate::codec::{Decoded, ExpertiseListing, Request, TagCodec};
use crate::config::HaboConfig;
use crate::error::{ConfigError, PublishError};
use crate::facet::{FacetSelection, RecordKind, query_filters};
use crate::publish::{Composer, EventSubmitter, Form, PublishOutcome};
use crate::refine::{EmptyState, Searchable, refine};
use nostr_client::{QueryOptions, QueryStatus, RelayPool};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A record type listed on a marketplace page.
pub trait MarketRecord: TagCodec + Searchable + Clone + Send + Sync + 'static {
    const RECORD_KIND: RecordKind;
}

impl MarketRecord for Request {
    const RECORD_KIND: RecordKind = RecordKind::Request;
}

impl MarketRecord for ExpertiseListing {
    const RECORD_KIND: RecordKind = RecordKind::ExpertiseListing;
}

/// One answered selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub facet: FacetSelection,
    /// Newest first
    pub records: Vec<Decoded<T>>,
    pub status: QueryStatus,
    pub from_cache: bool,
}

impl<T: Searchable + Clone> Page<T> {
    /// Records matching a search term.
    pub fn refine(&self, search_term: &str) -> Vec<Decoded<T>> {
        refine(&self.records, search_term)
    }

    /// Why nothing is shown for `search_term`, if nothing is.
    pub fn empty_state(&self, search_term: &str) -> Option<EmptyState> {
        if self.records.is_empty() {
            Some(EmptyState::NoRecords)
        } else if self.refine(search_term).is_empty() {
            Some(EmptyState::for_search(search_term))
        } else {
            None
        }
    }
}

/// Relay pool, selection cache and settings.
pub struct Marketplace {
    pool: RelayPool,
    config: HaboConfig,
    cache: RwLock<QueryCache>,
}

impl Marketplace {
    pub fn new(pool: RelayPool, config: HaboConfig) -> Self {
        Self::with_clock(pool, config, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: RelayPool, config: HaboConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = QueryCache::with_clock(config.stale_time(), clock);
        Self {
            pool,
            config,
            cache: RwLock::new(cache),
        }
    }

    /// Marketplace over the configured WebSocket relays.
    pub fn from_config(config: HaboConfig) -> Result<Self, ConfigError> {
        let pool = config.relay_pool()?;
        Ok(Self::new(pool, config))
    }

    pub fn pool(&self) -> &RelayPool {
        &self.pool
    }

    pub fn config(&self) -> &HaboConfig {
        &self.config
    }

    /// Answer a selection. Returns `None` only when `cancel` fired first.
    pub async fn query<T: MarketRecord>(
        &self,
        facet: &FacetSelection,
        cancel: CancellationToken,
    ) -> Option<Page<T>> {
        let kind = T::RECORD_KIND;

        let (cached, epoch) = {
            let cache = self.cache.read().await;
            (cache.get(kind, facet), cache.epoch(kind))
        };
        if let Some(cached) = cached {
            return Some(Page {
                facet: facet.clone(),
                records: Decoded::decode_all(&cached.events),
                status: cached.status,
                from_cache: true,
            });
        }

        let filters = query_filters(
            kind,
            facet,
            self.config.limit_for(kind),
            self.config.include_legacy_profiles,
        );
        let options = QueryOptions::with_timeout(self.config.query_timeout()).cancel_on(cancel);
        let result = self.pool.query(filters, options).await;

        if result.is_cancelled() {
            debug!("Query for {}/{} cancelled", kind, facet);
            return None;
        }

        let records = Decoded::<T>::decode_all(&result.events);
        let foreign = result.events.len() - records.len();
        if foreign > 0 {
            debug!("Dropped {} foreign {} events", foreign, kind);
        }

        // An empty timeout says nothing about the relays' contents.
        if result.status == QueryStatus::Complete || !result.events.is_empty() {
            let answer = CachedQuery {
                events: result.events,
                status: result.status,
            };
            self.cache
                .write()
                .await
                .insert(kind, facet.clone(), answer, epoch);
        }

        Some(Page {
            facet: facet.clone(),
            records,
            status: result.status,
            from_cache: false,
        })
    }

    /// Forget every cached selection of `kind`.
    pub async fn invalidate(&self, kind: RecordKind) -> usize {
        self.cache.write().await.invalidate_kind(kind)
    }

    /// Submit a composed form and, once accepted, invalidate the cached selections
    /// of its kind.
    pub async fn publish<F>(
        &self,
        composer: &mut Composer<F>,
        submitter: &dyn EventSubmitter,
    ) -> Result<PublishOutcome, PublishError>
    where
        F: Form,
        F::Record: MarketRecord,
    {
        let outcome = composer.submit(submitter).await?;
        let kind = <F::Record as MarketRecord>::RECORD_KIND;
        let dropped = self.invalidate(kind).await;
        info!(
            "Published {} {} to {} relays, dropped {} cached selections",
            kind,
            outcome.event_id,
            outcome.accepted_by.len(),
            dropped
        );
        Ok(outcome)
    }
}

/// What a page currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot<T> {
    /// Selection sequence number this snapshot belongs to
    pub generation: u64,
    pub facet: FacetSelection,
    pub records: Vec<Decoded<T>>,
    /// `None` until the selection has been answered
    pub status: Option<QueryStatus>,
    pub loading: bool,
}

impl<T> Default for FeedSnapshot<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            facet: FacetSelection::All,
            records: Vec::new(),
            status: None,
            loading: false,
        }
    }
}

struct FeedInner<T> {
    market: Arc<Marketplace>,
    generation: AtomicU64,
    active: watch::Sender<CancellationToken>,
    snapshot: watch::Sender<FeedSnapshot<T>>,
}

impl<T> Drop for FeedInner<T> {
    fn drop(&mut self) {
        self.active.borrow().cancel();
    }
}

/// Display state for one record type, driven by facet selections.
pub struct Feed<T> {
    inner: Arc<FeedInner<T>>,
}

impl<T> Clone for Feed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: MarketRecord> Feed<T> {
    pub fn new(market: Arc<Marketplace>) -> Self {
        let (active, _) = watch::channel(CancellationToken::new());
        let (snapshot, _) = watch::channel(FeedSnapshot::default());
        Self {
            inner: Arc::new(FeedInner {
                market,
                generation: AtomicU64::new(0),
                active,
                snapshot,
            }),
        }
    }

    /// Watch displayed snapshots.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot<T>> {
        self.inner.snapshot.subscribe()
    }

    /// Currently displayed snapshot.
    pub fn snapshot(&self) -> FeedSnapshot<T> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn market(&self) -> &Arc<Marketplace> {
        &self.inner.market
    }

    /// Switch to `facet`, superseding any selection still in flight.
    ///
    /// The returned task yields `true` if its result was displayed.
    pub fn select(&self, facet: impl Into<FacetSelection>) -> JoinHandle<bool> {
        let facet = facet.into();
        let token = CancellationToken::new();

        // Numbering and token swap share one lock.
        let mut generation = 0;
        self.inner.active.send_modify(|active| {
            generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            active.cancel();
            *active = token.clone();
        });

        self.inner.snapshot.send_if_modified(|snapshot| {
            if snapshot.generation > generation {
                return false;
            }
            snapshot.generation = generation;
            snapshot.facet = facet.clone();
            snapshot.loading = true;
            true
        });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let Some(page) = inner.market.query::<T>(&facet, token).await else {
                debug!("Selection {} ({}) superseded in flight", generation, facet);
                return false;
            };

            let displayed = inner.snapshot.send_if_modified(|snapshot| {
                if inner.generation.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *snapshot = FeedSnapshot {
                    generation,
                    facet: page.facet,
                    records: page.records,
                    status: Some(page.status),
                    loading: false,
                };
                true
            });

            if !displayed {
                debug!("Discarding late result for selection {}", generation);
            }
            displayed
        })
    }

    /// Re-run the current selection.
    pub fn refresh(&self) -> JoinHandle<bool> {
        let facet = self.inner.snapshot.borrow().facet.clone();
        self.select(facet)
    }

    /// Publish through the marketplace, then refresh this feed.
    pub async fn publish<F>(
        &self,
        composer: &mut Composer<F>,
        submitter: &dyn EventSubmitter,
    ) -> Result<(PublishOutcome, JoinHandle<bool>), PublishError>
    where
        F: Form<Record = T>,
    {
        let outcome = self.inner.market.publish(composer, submitter).await?;
        Ok((outcome, self.refresh()))
    }
}
