//! Protocol-wide constants.

/// Path of the domain's WebSocket endpoint, appended to the public URL.
pub const SOCKET_PATH: &str = "/ws";

/// Default domain public URL.
pub const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:7200";

/// Default time to wait for a correlated response.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Public STUN server offered to peer connections when none is configured.
pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

/// Label of the data channel opened on every peer connection.
pub const DATA_CHANNEL_LABEL: &str = "audiocloud";
