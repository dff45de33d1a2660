//! In-process relay.
//!
//! `MemoryRelay` stores events in memory and answers queries with NIP-01 filter
//! semantics. It backs offline use and lets tests script slow, silent, or rejecting
//! relays without a network.

use crate::error::Result;
use crate::filter::Filter;
use crate::relay::{PublishConfirmation, RelaySource};
use async_trait::async_trait;
use nostr::{Event, sort_events};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

/// How a [`MemoryRelay`] answers.
#[derive(Debug, Clone, Default)]
pub struct MemoryRelayBehavior {
    /// Wait this long before answering a fetch
    pub delay: Option<Duration>,
    /// Never answer a fetch (not even EOSE)
    pub silent: bool,
    /// Reject every published event with this message
    pub reject_publish: Option<String>,
}

/// An in-memory relay.
pub struct MemoryRelay {
    url: String,
    events: RwLock<Vec<Event>>,
    behavior: RwLock<MemoryRelayBehavior>,
    fetches: AtomicUsize,
}

impl MemoryRelay {
    /// Create an empty relay.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_events(url, Vec::new())
    }

    /// Create a relay pre-loaded with events.
    pub fn with_events(url: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            url: url.into(),
            events: RwLock::new(events),
            behavior: RwLock::new(MemoryRelayBehavior::default()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Store an event as if it had been published.
    pub async fn insert(&self, event: Event) {
        self.events.write().await.push(event);
    }

    /// Replace the answering behavior.
    pub async fn set_behavior(&self, behavior: MemoryRelayBehavior) {
        *self.behavior.write().await = behavior;
    }

    /// Set or clear the fetch delay, keeping other behavior.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        self.behavior.write().await.delay = delay;
    }

    /// Number of fetches served (or started) so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of stored events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Whether no events are stored.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    async fn matching(&self, filter: &Filter) -> Vec<Event> {
        let mut matched: Vec<Event> = self
            .events
            .read()
            .await
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        sort_events(&mut matched);
        if let Some(limit) = filter.limit {
            matched.truncate(limit as usize);
        }
        matched
    }
}

#[async_trait]
impl RelaySource for MemoryRelay {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(
        &self,
        subscription_id: &str,
        filters: &[Filter],
        sink: mpsc::Sender<Event>,
    ) -> Result<()> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.read().await.clone();

        // Answers reflect the store as of the REQ, however late they are sent.
        let mut answer = Vec::new();
        for filter in filters {
            answer.extend(self.matching(filter).await);
        }

        if behavior.silent {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = behavior.delay {
            tokio::time::sleep(delay).await;
        }

        let mut sent = 0usize;
        for event in answer {
            if sink.send(event).await.is_err() {
                return Ok(());
            }
            sent += 1;
        }

        debug!(
            "Memory relay {} answered {} with {} events",
            self.url, subscription_id, sent
        );
        Ok(())
    }

    async fn publish(&self, event: &Event) -> Result<PublishConfirmation> {
        let reject = self.behavior.read().await.reject_publish.clone();

        if let Some(message) = reject {
            return Ok(PublishConfirmation {
                relay_url: self.url.clone(),
                event_id: event.id.clone(),
                accepted: false,
                message,
            });
        }

        self.insert(event.clone()).await;
        Ok(PublishConfirmation {
            relay_url: self.url.clone(),
            event_id: event.id.clone(),
            accepted: true,
            message: String::new(),
        })
    }
}
