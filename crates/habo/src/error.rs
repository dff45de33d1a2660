//! Error types for the marketplace layer.
//!
//! Reads never fail: relay trouble becomes an empty result. Only configuration and
//! the user's own publish attempts produce errors.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid relay url {url}: {reason}")]
    Relay { url: String, reason: String },
}

/// Publish failures. The form that produced the attempt is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// A required field is blank; nothing was sent
    #[error("{field} is required")]
    Validation { field: &'static str },

    /// The signer refused or failed
    #[error("signing failed: {0}")]
    Signing(String),

    /// A relay answered OK=false
    #[error("rejected by {relay}: {message}")]
    Rejected { relay: String, message: String },

    /// No relay acknowledged the event
    #[error("no relay accepted the event: {0}")]
    NoRelayAccepted(String),
}

/// Top-level error.
#[derive(Error, Debug)]
pub enum HaboError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Client(#[from] nostr_client::ClientError),
}

pub type Result<T> = std::result::Result<T, HaboError>;
