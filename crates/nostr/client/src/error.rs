//! Client error types

use crate::message::MessageError;
use thiserror::Error;

/// Client error type
#[derive(Error, Debug)]
pub enum ClientError {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Malformed relay message
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// Subscription closed by the relay
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Timeout error
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Relay closed the connection before answering
    #[error("Connection closed by relay")]
    ConnectionClosed,
}

/// Client result type
pub type Result<T> = std::result::Result<T, ClientError>;
