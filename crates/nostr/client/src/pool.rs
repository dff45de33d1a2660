//! Relay pool for querying and publishing across multiple Nostr relays.
//!
//! A query fans out to every relay at once, collects whatever arrives before the
//! deadline, and merges it into one ordered result. A query that times out is not an
//! error: the events collected so far are the answer. A cancelled query yields nothing.

use crate::error::Result;
use crate::filter::Filter;
use crate::merge::merge_events;
use crate::relay::{PublishConfirmation, RelayConfig, RelayConnection, RelaySource};
use crate::subscription::generate_subscription_id;
use futures::future::join_all;
use nostr::Event;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default bound on a single query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_millis(3000);

const EVENT_BUFFER: usize = 256;

/// Options for a single query.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Upper bound on how long to wait for relays
    pub timeout: Duration,
    /// Cancelling this token abandons the query
    pub cancel: CancellationToken,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_QUERY_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }
}

impl QueryOptions {
    /// Options with the given timeout and a fresh cancellation token.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    /// Replace the cancellation token.
    pub fn cancel_on(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// How a query ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Every relay finished sending stored events
    Complete,
    /// The deadline passed; events are whatever arrived in time
    TimedOut,
    /// The caller cancelled; events are empty
    Cancelled,
}

/// Merged result of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Deduplicated events, newest first
    pub events: Vec<Event>,
    /// How the query ended
    pub status: QueryStatus,
}

impl QueryResult {
    /// Whether the caller cancelled this query.
    pub fn is_cancelled(&self) -> bool {
        self.status == QueryStatus::Cancelled
    }
}

/// Per-relay outcome of a publish.
pub type RelayPublishResult = (String, Result<PublishConfirmation>);

/// A pool of Nostr relays.
#[derive(Clone, Default)]
pub struct RelayPool {
    relays: Vec<Arc<dyn RelaySource>>,
}

impl RelayPool {
    /// Create an empty relay pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool over existing relay sources.
    pub fn with_relays(relays: Vec<Arc<dyn RelaySource>>) -> Self {
        Self { relays }
    }

    /// Create a pool of WebSocket relays.
    pub fn from_urls<S: AsRef<str>>(urls: &[S], config: RelayConfig) -> Result<Self> {
        let relays = urls
            .iter()
            .map(|url| {
                RelayConnection::with_config(url.as_ref(), config.clone())
                    .map(|conn| Arc::new(conn) as Arc<dyn RelaySource>)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { relays })
    }

    /// Add a relay to the pool.
    pub fn add_relay(&mut self, relay: Arc<dyn RelaySource>) {
        info!("Adding relay to pool: {}", relay.url());
        self.relays.push(relay);
    }

    /// Get all relay URLs in the pool.
    pub fn relay_urls(&self) -> Vec<String> {
        self.relays.iter().map(|r| r.url().to_string()).collect()
    }

    /// Number of relays in the pool.
    pub fn len(&self) -> usize {
        self.relays.len()
    }

    /// Whether the pool has no relays.
    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Query every relay and merge the answers.
    ///
    /// Never fails. Relay errors are logged and that relay contributes nothing. If
    /// every filter carries a limit, the merged result is capped at the largest one.
    pub async fn query(&self, filters: Vec<Filter>, options: QueryOptions) -> QueryResult {
        let subscription_id = generate_subscription_id();
        let cap = filters
            .iter()
            .map(|f| f.limit)
            .collect::<Option<Vec<_>>>()
            .and_then(|limits| limits.into_iter().max());
        let filters: Arc<[Filter]> = filters.into();

        debug!(
            "Query {} across {} relays (timeout {:?})",
            subscription_id,
            self.relays.len(),
            options.timeout
        );

        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let stop = options.cancel.child_token();
        let mut fetches = JoinSet::new();

        for relay in &self.relays {
            let relay = Arc::clone(relay);
            let filters = Arc::clone(&filters);
            let tx = tx.clone();
            let stop = stop.clone();
            let subscription_id = subscription_id.clone();

            fetches.spawn(async move {
                tokio::select! {
                    _ = stop.cancelled() => {}
                    result = relay.fetch(&subscription_id, &filters, tx) => {
                        if let Err(e) = result {
                            warn!("Relay {} failed query {}: {}", relay.url(), subscription_id, e);
                        }
                    }
                }
            });
        }
        drop(tx);

        let deadline = tokio::time::sleep(options.timeout);
        tokio::pin!(deadline);

        let mut collected = Vec::new();
        let status = loop {
            tokio::select! {
                biased;
                _ = options.cancel.cancelled() => break QueryStatus::Cancelled,
                _ = &mut deadline => break QueryStatus::TimedOut,
                received = rx.recv() => match received {
                    Some(event) => collected.push(event),
                    None => break QueryStatus::Complete,
                },
            }
        };

        stop.cancel();
        fetches.abort_all();

        if status == QueryStatus::Cancelled {
            debug!("Query {} cancelled", subscription_id);
            return QueryResult {
                events: Vec::new(),
                status,
            };
        }

        while let Ok(event) = rx.try_recv() {
            collected.push(event);
        }

        let received = collected.len();
        let mut events = merge_events(collected);
        if let Some(cap) = cap {
            events.truncate(cap as usize);
        }

        if status == QueryStatus::TimedOut {
            info!(
                "Query {} timed out after {:?} with {} events",
                subscription_id,
                options.timeout,
                events.len()
            );
        } else {
            debug!(
                "Query {} complete: {} received, {} after merge",
                subscription_id,
                received,
                events.len()
            );
        }

        QueryResult { events, status }
    }

    /// Publish a signed event to every relay concurrently.
    ///
    /// Returns one entry per relay, in pool order.
    pub async fn publish(&self, event: &Event) -> Vec<RelayPublishResult> {
        if self.relays.is_empty() {
            warn!("Publishing {} with no relays configured", event.id);
        }

        let attempts = self.relays.iter().map(|relay| async move {
            let result = relay.publish(event).await;
            match &result {
                Ok(confirmation) if confirmation.accepted => {
                    debug!("Relay {} accepted {}", relay.url(), event.id);
                }
                Ok(confirmation) => {
                    warn!(
                        "Relay {} rejected {}: {}",
                        relay.url(),
                        event.id,
                        confirmation.message
                    );
                }
                Err(e) => warn!("Publish to {} failed: {}", relay.url(), e),
            }
            (relay.url().to_string(), result)
        });

        join_all(attempts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryRelay, MemoryRelayBehavior};
    use pretty_assertions::assert_eq;

    fn event(id: &str, created_at: u64) -> Event {
        Event {
            id: id.to_string(),
            pubkey: "pk".to_string(),
            created_at,
            kind: 9802,
            tags: vec![],
            content: String::new(),
            sig: String::new(),
        }
    }

    fn pool_of(relays: &[&Arc<MemoryRelay>]) -> RelayPool {
        RelayPool::with_relays(
            relays
                .iter()
                .map(|r| Arc::clone(*r) as Arc<dyn RelaySource>)
                .collect(),
        )
    }

    fn ids(result: &QueryResult) -> Vec<&str> {
        result.events.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_query_merges_relays() {
        let a = Arc::new(MemoryRelay::with_events(
            "memory://a",
            vec![event("x", 100), event("y", 300)],
        ));
        let b = Arc::new(MemoryRelay::with_events(
            "memory://b",
            vec![event("x", 100), event("z", 100)],
        ));
        let pool = pool_of(&[&a, &b]);

        let result = pool
            .query(vec![Filter::new().kinds([9802])], QueryOptions::default())
            .await;

        assert_eq!(result.status, QueryStatus::Complete);
        assert_eq!(ids(&result), vec!["y", "x", "z"]);
    }

    #[tokio::test]
    async fn test_query_caps_at_limit() {
        let a = Arc::new(MemoryRelay::with_events(
            "memory://a",
            vec![event("a", 1), event("b", 2)],
        ));
        let b = Arc::new(MemoryRelay::with_events(
            "memory://b",
            vec![event("c", 3), event("d", 4)],
        ));
        let pool = pool_of(&[&a, &b]);

        let result = pool
            .query(vec![Filter::new().limit(2)], QueryOptions::default())
            .await;
        assert_eq!(ids(&result), vec!["d", "c"]);
    }

    #[tokio::test]
    async fn test_empty_pool_completes_empty() {
        let result = RelayPool::new()
            .query(vec![Filter::new()], QueryOptions::default())
            .await;
        assert_eq!(result.status, QueryStatus::Complete);
        assert!(result.events.is_empty());
    }

    #[tokio::test]
    async fn test_silent_relay_times_out_with_partial_results() {
        let fast = Arc::new(MemoryRelay::with_events("memory://fast", vec![event("a", 1)]));
        let silent = Arc::new(MemoryRelay::new("memory://silent"));
        silent
            .set_behavior(MemoryRelayBehavior {
                silent: true,
                ..Default::default()
            })
            .await;
        let pool = pool_of(&[&fast, &silent]);

        let result = pool
            .query(
                vec![Filter::new()],
                QueryOptions::with_timeout(Duration::from_millis(100)),
            )
            .await;

        assert_eq!(result.status, QueryStatus::TimedOut);
        assert_eq!(ids(&result), vec!["a"]);
    }

    #[tokio::test]
    async fn test_cancelled_query_yields_nothing() {
        let slow = Arc::new(MemoryRelay::with_events("memory://slow", vec![event("a", 1)]));
        slow.set_delay(Some(Duration::from_millis(500))).await;
        let pool = pool_of(&[&slow]);

        let cancel = CancellationToken::new();
        let options = QueryOptions::default().cancel_on(cancel.clone());
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let result = pool.query(vec![Filter::new()], options).await;
        trigger.await.unwrap();

        assert!(result.is_cancelled());
        assert!(result.events.is_empty());
    }

    #[tokio::test]
    async fn test_publish_reports_each_relay() {
        let ok = Arc::new(MemoryRelay::new("memory://ok"));
        let rejecting = Arc::new(MemoryRelay::new("memory://no"));
        rejecting
            .set_behavior(MemoryRelayBehavior {
                reject_publish: Some("blocked".to_string()),
                ..Default::default()
            })
            .await;
        let pool = pool_of(&[&ok, &rejecting]);

        let results = pool.publish(&event("e", 1)).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "memory://ok");
        assert!(results[0].1.as_ref().unwrap().accepted);
        assert!(!results[1].1.as_ref().unwrap().accepted);
        assert_eq!(results[1].1.as_ref().unwrap().message, "blocked");
        assert_eq!(ok.len().await, 1);
        assert!(rejecting.is_empty().await);
    }
}
