//! Settings types.
//!
//! Every struct is `#[serde(default)]` so a partial user file only needs the
//! keys it changes.

use std::time::Duration;

use audiocloud_core::constants::{
    DEFAULT_PUBLIC_URL, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_STUN_URL, SOCKET_PATH,
};
use audiocloud_core::logging::{init_json_subscriber, init_subscriber};
use audiocloud_core::protocol::IceServer;
use audiocloud_core::retry::{
    Backoff, DEFAULT_BASE_DELAY_MS, DEFAULT_JITTER_FACTOR, DEFAULT_MAX_DELAY_MS,
};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings for a domain client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DomainSettings {
    /// Public base URL of the domain (`http://` or `https://`).
    pub public_url: String,
    /// Time to wait for a correlated response, in milliseconds.
    pub request_timeout_ms: u64,
    /// ICE servers offered to new peer connections.
    pub ice_servers: Vec<IceServer>,
    /// Socket reconnect backoff.
    pub reconnect: ReconnectSettings,
    /// Socket transport tuning.
    pub socket: SocketSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            ice_servers: vec![IceServer {
                urls: vec![DEFAULT_STUN_URL.to_string()],
                username: None,
                credential: None,
            }],
            reconnect: ReconnectSettings::default(),
            socket: SocketSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl DomainSettings {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// WebSocket URL of the domain: `https` becomes `wss`, `http` becomes
    /// `ws`, and `/ws` is appended.
    pub fn socket_url(&self) -> Result<String> {
        let trimmed = self.public_url.trim_end_matches('/');
        let rest = if let Some(rest) = trimmed.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = trimmed.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(SettingsError::InvalidValue(format!(
                "publicUrl: expected http:// or https://, got '{}'",
                self.public_url
            )));
        };
        Ok(format!("{rest}{SOCKET_PATH}"))
    }
}

/// Smallest reconnect delay a configuration can produce.
pub const MIN_RECONNECT_DELAY_MS: u64 = 1;

/// Reconnect backoff for the socket transport.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectSettings {
    /// First delay in milliseconds.
    pub base_delay_ms: u64,
    /// Delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter factor (0.0–1.0).
    pub jitter_factor: f64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl ReconnectSettings {
    /// Fresh backoff state for these settings.
    ///
    /// Delays are floored at [`MIN_RECONNECT_DELAY_MS`] and the cap never sits
    /// below the base; a NaN jitter factor counts as no jitter.
    pub fn backoff(&self) -> Backoff {
        let base_delay_ms = self.base_delay_ms.max(MIN_RECONNECT_DELAY_MS);
        let max_delay_ms = self.max_delay_ms.max(base_delay_ms);
        let jitter_factor = if self.jitter_factor.is_nan() {
            0.0
        } else {
            self.jitter_factor.clamp(0.0, 1.0)
        };
        Backoff::new(base_delay_ms, max_delay_ms, jitter_factor)
    }
}

/// Socket transport tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocketSettings {
    /// Capacity of the outbound frame queue; a full queue rejects sends as busy.
    pub outbound_buffer: usize,
}

impl Default for SocketSettings {
    fn default() -> Self {
        Self {
            outbound_buffer: 64,
        }
    }
}

/// Log output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter level when `RUST_LOG` is unset.
    pub level: String,
    /// One JSON object per line instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl LoggingSettings {
    /// Install the global tracing subscriber described by these settings.
    ///
    /// Called by the embedding application; the client crates never install
    /// one themselves. Later calls are no-ops.
    pub fn init(&self) {
        if self.json {
            init_json_subscriber(&self.level);
        } else {
            init_subscriber(&self.level);
        }
    }
}
