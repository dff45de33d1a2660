//! Selection-keyed query cache with a staleness window.
//!
//! Entries are keyed on `(RecordKind, FacetSelection)` and served while younger than
//! the stale time. Time comes from an injectable [`Clock`].

use crate::facet::{FacetSelection, RecordKind};
use nostr::Event;
use nostr_client::QueryStatus;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default staleness window.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

/// Cache key.
pub type CacheKey = (RecordKind, FacetSelection);

/// A cached answer and how the query that produced it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedQuery {
    pub events: Vec<Event>,
    pub status: QueryStatus,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    query: CachedQuery,
    fetched_at: Instant,
}

/// Query results by selection.
///
/// Each record kind has an epoch that every invalidation advances. A result fetched
/// under an older epoch is never stored, so a query that was already in flight when a
/// publish invalidated the kind cannot put its stale answer back.
pub struct QueryCache {
    stale_time: Duration,
    clock: Arc<dyn Clock>,
    entries: HashMap<CacheKey, CacheEntry>,
    epochs: HashMap<RecordKind, u64>,
}

impl QueryCache {
    pub fn with_clock(stale_time: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            stale_time,
            clock,
            entries: HashMap::new(),
            epochs: HashMap::new(),
        }
    }

    /// Fresh cached answer for a selection, if any.
    pub fn get(&self, kind: RecordKind, facet: &FacetSelection) -> Option<CachedQuery> {
        let key = (kind, facet.clone());
        match self.entries.get(&key) {
            Some(entry) if self.is_fresh(entry) => {
                debug!("Cache hit for {}/{}", kind, facet);
                Some(entry.query.clone())
            }
            Some(_) => {
                debug!("Cache stale for {}/{}", kind, facet);
                None
            }
            None => {
                debug!("Cache miss for {}/{}", kind, facet);
                None
            }
        }
    }

    /// Current epoch of `kind`. Read it before querying and hand it to
    /// [`insert`](Self::insert).
    pub fn epoch(&self, kind: RecordKind) -> u64 {
        self.epochs.get(&kind).copied().unwrap_or(0)
    }

    /// Store an answer fetched during `epoch`, stamped now.
    ///
    /// Returns `false` and stores nothing if `kind` was invalidated since.
    pub fn insert(
        &mut self,
        kind: RecordKind,
        facet: FacetSelection,
        query: CachedQuery,
        epoch: u64,
    ) -> bool {
        if epoch != self.epoch(kind) {
            debug!("Not caching {}/{}: invalidated while in flight", kind, facet);
            return false;
        }
        let fetched_at = self.clock.now();
        self.entries
            .insert((kind, facet), CacheEntry { query, fetched_at });
        true
    }

    /// Drop every selection of `kind` and advance its epoch. Returns how many entries
    /// were removed.
    pub fn invalidate_kind(&mut self, kind: RecordKind) -> usize {
        *self.epochs.entry(kind).or_insert(0) += 1;

        let before = self.entries.len();
        self.entries.retain(|(k, _), _| *k != kind);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Invalidated {} cached {} selections", removed, kind);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.clock.now().saturating_duration_since(entry.fetched_at) < self.stale_time
    }
}
