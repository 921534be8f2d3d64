//! Error hierarchy for the domain client.
//!
//! - [`ClientError`]: everything a client operation or the subscriber can see
//! - [`TransportError`]: failures of a socket or peer channel
//! - [`CodecError`]: `MessagePack` encode/decode failures
//! - [`DomainError`]: opaque error payload reported by the domain

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::RequestId;
use crate::params::ParameterTarget;
use crate::protocol::{MessageKind, RequestKind};

/// Errors surfaced by the domain client.
///
/// Request-level variants are returned from the call that produced them.
/// `MessageParse` and `IceCandidate` are transport faults and only ever
/// reach the subscriber.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No transport is connected; nothing was sent.
    #[error("not connected to the domain")]
    NotConnected,

    /// The request was sent but no answer arrived in time.
    #[error("request {request_id} timed out")]
    Timeout {
        /// The request that timed out.
        request_id: RequestId,
    },

    /// The socket's outbound buffer is full.
    #[error("transport is busy")]
    Busy,

    /// An inbound frame could not be decoded.
    #[error("failed to parse message: {0}")]
    MessageParse(#[source] CodecError),

    /// Applying a remote ICE candidate failed.
    #[error("failed to apply ICE candidate: {0}")]
    IceCandidate(#[source] TransportError),

    /// Sending on the selected transport failed.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The domain answered with an error.
    #[error("domain error: {0}")]
    Remote(DomainError),

    /// The request kind has no response kind and cannot be awaited.
    #[error("request kind {kind} has no response")]
    Unroutable {
        /// The offending request kind.
        kind: RequestKind,
    },

    /// A correlated response arrived with an unexpected shape.
    #[error("unexpected response {kind}")]
    UnexpectedResponse {
        /// Kind of the response that arrived.
        kind: MessageKind,
    },

    /// Peer connections need a connector and none was configured.
    #[error("peer connections are not available")]
    PeerUnavailable,

    /// A parameter edit does not match the task's schema.
    #[error("invalid parameter change for {target}: {reason}")]
    InvalidParameter {
        /// The addressed target.
        target: ParameterTarget,
        /// Why it was rejected.
        reason: String,
    },
}

impl ClientError {
    /// Short snake_case label, used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::Timeout { .. } => "timeout",
            Self::Busy => "busy",
            Self::MessageParse(_) => "message_parse",
            Self::IceCandidate(_) => "ice_candidate",
            Self::Transport(_) => "transport",
            Self::Remote(_) => "remote",
            Self::Unroutable { .. } => "unroutable",
            Self::UnexpectedResponse { .. } => "unexpected_response",
            Self::PeerUnavailable => "peer_unavailable",
            Self::InvalidParameter { .. } => "invalid_parameter",
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Busy => Self::Busy,
            other => Self::Transport(other),
        }
    }
}

/// Failures of a single transport.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The transport is closed.
    #[error("transport closed")]
    Closed,
    /// The outbound buffer is full.
    #[error("outbound buffer full")]
    Busy,
    /// Establishing the connection failed.
    #[error("connect failed: {0}")]
    Connect(String),
    /// The underlying channel reported an error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// `MessagePack` codec failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    /// Deserialization failed.
    #[error("decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Error payload reported by the domain, passed through verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainError(pub serde_json::Value);

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
