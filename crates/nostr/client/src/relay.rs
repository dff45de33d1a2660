//! Single relay access.
//!
//! [`RelaySource`] is the per-relay seam the pool talks to. [`RelayConnection`] is the
//! WebSocket implementation: each call opens a short-lived socket, which keeps the
//! client pull-only (no long-lived subscriptions, no reconnection state to manage).

use crate::error::{ClientError, Result};
use crate::filter::Filter;
use crate::message::{ClientMessage, RelayMessage};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use nostr::{Event, verify_event_id};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

/// Confirmation result for event publishing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfirmation {
    /// Relay that answered
    pub relay_url: String,
    /// Event ID that was published
    pub event_id: String,
    /// Whether the relay accepted the event
    pub accepted: bool,
    /// Message from the relay (empty if accepted, error message if rejected)
    pub message: String,
}

/// A relay that can answer point-in-time queries and accept events.
#[async_trait]
pub trait RelaySource: Send + Sync {
    /// Relay URL, used for logging and publish results.
    fn url(&self) -> &str;

    /// Stream stored events matching `filters` into `sink`, returning once the relay
    /// signals end of stored events. A closed `sink` means the caller stopped listening.
    async fn fetch(
        &self,
        subscription_id: &str,
        filters: &[Filter],
        sink: mpsc::Sender<Event>,
    ) -> Result<()>;

    /// Send a signed event and wait for the relay's OK.
    async fn publish(&self, event: &Event) -> Result<PublishConfirmation>;
}

/// Relay connection configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// How long to wait for an OK after sending an event
    pub confirmation_timeout: Duration,
    /// Drop events whose id does not match their content hash
    pub verify_ids: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            confirmation_timeout: Duration::from_secs(10),
            verify_ids: true,
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket relay connection
pub struct RelayConnection {
    /// Relay URL
    url: Url,
    /// URL as given, for reporting
    url_str: String,
    /// Configuration
    config: RelayConfig,
}

impl RelayConnection {
    /// Create a relay connection with default configuration.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_config(url, RelayConfig::default())
    }

    /// Create a relay connection with custom configuration.
    pub fn with_config(url: &str, config: RelayConfig) -> Result<Self> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(ClientError::InvalidUrl(format!(
                "expected ws:// or wss://, got {}",
                url
            )));
        }

        Ok(Self {
            url: parsed,
            url_str: url.to_string(),
            config,
        })
    }

    async fn open(&self) -> Result<WsStream> {
        debug!("Connecting to relay: {}", self.url);

        match timeout(self.config.connect_timeout, connect_async(self.url.as_str())).await {
            Ok(Ok((stream, _))) => Ok(stream),
            Ok(Err(e)) => Err(ClientError::WebSocket(e.to_string())),
            Err(_) => Err(ClientError::Timeout(format!(
                "Connection timeout after {:?}",
                self.config.connect_timeout
            ))),
        }
    }

    async fn send(ws: &mut WsStream, msg: &ClientMessage) -> Result<()> {
        let json = msg.to_json()?;
        ws.send(Message::Text(json.into()))
            .await
            .map_err(|e| ClientError::WebSocket(e.to_string()))
    }

    /// Read the next relay message, answering pings along the way.
    ///
    /// Returns `Ok(None)` once the relay closes the socket.
    async fn next_message(&self, ws: &mut WsStream) -> Result<Option<RelayMessage>> {
        while let Some(frame) = ws.next().await {
            match frame.map_err(|e| ClientError::WebSocket(e.to_string()))? {
                Message::Text(text) => match RelayMessage::from_json(text.as_str()) {
                    Ok(msg) => return Ok(Some(msg)),
                    Err(e) => warn!("Ignoring malformed message from {}: {}", self.url, e),
                },
                Message::Ping(data) => {
                    let _ = ws.send(Message::Pong(data)).await;
                }
                Message::Close(_) => {
                    info!("Relay {} closed connection", self.url);
                    return Ok(None);
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Wait for the OK answering `event_id`.
    async fn await_ok(&self, ws: &mut WsStream, event_id: &str) -> Result<PublishConfirmation> {
        loop {
            match self.next_message(ws).await? {
                Some(RelayMessage::Ok {
                    event_id: answered,
                    success,
                    message,
                }) if answered == event_id => {
                    return Ok(PublishConfirmation {
                        relay_url: self.url_str.clone(),
                        event_id: answered,
                        accepted: success,
                        message,
                    });
                }
                Some(RelayMessage::Notice { message }) => {
                    warn!("Notice from {}: {}", self.url, message);
                }
                Some(_) => {}
                None => return Err(ClientError::ConnectionClosed),
            }
        }
    }
}

#[async_trait]
impl RelaySource for RelayConnection {
    fn url(&self) -> &str {
        &self.url_str
    }

    async fn fetch(
        &self,
        subscription_id: &str,
        filters: &[Filter],
        sink: mpsc::Sender<Event>,
    ) -> Result<()> {
        let mut ws = self.open().await?;
        Self::send(
            &mut ws,
            &ClientMessage::Req {
                subscription_id: subscription_id.to_string(),
                filters: filters.to_vec(),
            },
        )
        .await?;

        let mut received = 0usize;
        let outcome = loop {
            let Some(msg) = self.next_message(&mut ws).await? else {
                break Err(ClientError::ConnectionClosed);
            };

            match msg {
                RelayMessage::Event {
                    subscription_id: sub,
                    event,
                } if sub == subscription_id => {
                    if self.config.verify_ids && !verify_event_id(&event).unwrap_or(false) {
                        debug!("Dropping event {} from {}: id mismatch", event.id, self.url);
                        continue;
                    }
                    received += 1;
                    if sink.send(event).await.is_err() {
                        break Ok(());
                    }
                }
                RelayMessage::Eose { subscription_id: sub } if sub == subscription_id => {
                    break Ok(());
                }
                RelayMessage::Closed {
                    subscription_id: sub,
                    message,
                } if sub == subscription_id => {
                    break Err(ClientError::Subscription(message));
                }
                RelayMessage::Notice { message } => {
                    warn!("Notice from {}: {}", self.url, message);
                }
                _ => {}
            }
        };

        debug!(
            "Subscription {} on {} finished with {} events",
            subscription_id, self.url, received
        );

        let _ = Self::send(
            &mut ws,
            &ClientMessage::Close {
                subscription_id: subscription_id.to_string(),
            },
        )
        .await;
        let _ = ws.close(None).await;

        outcome
    }

    async fn publish(&self, event: &Event) -> Result<PublishConfirmation> {
        let mut ws = self.open().await?;
        Self::send(&mut ws, &ClientMessage::Event(event.clone())).await?;

        let result = match timeout(
            self.config.confirmation_timeout,
            self.await_ok(&mut ws, &event.id),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(format!(
                "Event confirmation timeout after {:?}",
                self.config.confirmation_timeout
            ))),
        };

        let _ = ws.close(None).await;
        result
    }
}
