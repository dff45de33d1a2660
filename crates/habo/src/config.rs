//! Marketplace configuration.
//!
//! Stored as camelCase JSON. Every field has a default, so an empty object (or a
//! missing file) is a valid configuration.
//!
//! ```json
//! {
//!   "relays": ["wss://relay.damus.io"],
//!   "queryTimeoutMs": 3000,
//!   "staleTimeSecs": 30,
//!   "requestLimit": 50,
//!   "listingLimit": 100,
//!   "includeLegacyProfiles": false,
//!   "connectTimeoutMs": 5000
//! }
//! ```

use crate::error::ConfigError;
use crate::cache::DEFAULT_STALE_TIME;
use crate::facet::{DEFAULT_LISTING_LIMIT, DEFAULT_REQUEST_LIMIT, RecordKind};
use nostr_client::{DEFAULT_QUERY_TIMEOUT, DEFAULT_RELAYS, RelayConfig, RelayPool};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "HABO_CONFIG";

/// Marketplace configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HaboConfig {
    /// Relay URLs to query and publish to
    #[serde(default = "default_relays")]
    pub relays: Vec<String>,

    /// Upper bound on a single query
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// How long a cached selection is served without re-querying
    #[serde(default = "default_stale_time_secs")]
    pub stale_time_secs: u64,

    #[serde(default = "default_request_limit")]
    pub request_limit: u64,

    #[serde(default = "default_listing_limit")]
    pub listing_limit: u64,

    /// Also read kind-9803 source profiles
    #[serde(default)]
    pub include_legacy_profiles: bool,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_relays() -> Vec<String> {
    DEFAULT_RELAYS.iter().map(|s| s.to_string()).collect()
}

fn default_query_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT.as_millis() as u64
}

fn default_stale_time_secs() -> u64 {
    DEFAULT_STALE_TIME.as_secs()
}

fn default_request_limit() -> u64 {
    DEFAULT_REQUEST_LIMIT
}

fn default_listing_limit() -> u64 {
    DEFAULT_LISTING_LIMIT
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

impl Default for HaboConfig {
    fn default() -> Self {
        Self {
            relays: default_relays(),
            query_timeout_ms: default_query_timeout_ms(),
            stale_time_secs: default_stale_time_secs(),
            request_limit: default_request_limit(),
            listing_limit: default_listing_limit(),
            include_legacy_profiles: false,
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl HaboConfig {
    /// Load from a JSON file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from `$HABO_CONFIG` if set, otherwise defaults.
    pub fn from_env_or_default() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Replace the relay list.
    pub fn with_relays(mut self, relays: Vec<String>) -> Self {
        self.relays = relays;
        self
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Page size for a record type.
    pub fn limit_for(&self, kind: RecordKind) -> u64 {
        match kind {
            RecordKind::Request => self.request_limit,
            RecordKind::ExpertiseListing => self.listing_limit,
        }
    }

    /// WebSocket pool over the configured relays.
    pub fn relay_pool(&self) -> Result<RelayPool, ConfigError> {
        let relay_config = RelayConfig {
            connect_timeout: self.connect_timeout(),
            confirmation_timeout: self.query_timeout().max(Duration::from_secs(5)),
            ..Default::default()
        };

        RelayPool::from_urls(&self.relays, relay_config).map_err(|e| ConfigError::Relay {
            url: self.relays.join(", "),
            reason: e.to_string(),
        })
    }
}
