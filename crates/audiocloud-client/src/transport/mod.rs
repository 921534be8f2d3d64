//! Transports to the domain and the events they feed into the client.
//!
//! - [`socket`]: the always-on, reconnecting WebSocket
//! - [`peer`]: negotiated peer data channels
//!
//! Every transport reports through [`TransportEvent`]s that the client's
//! dispatch loop drains in arrival order.

pub mod peer;
pub mod socket;

use std::sync::atomic::{AtomicU8, Ordering};

use audiocloud_core::errors::{ClientError, TransportError};
use audiocloud_core::ids::SocketId;
use audiocloud_core::protocol::{IceCandidate, SocketMessage};

/// Outbound half of a transport.
pub trait Transport: Send + Sync {
    /// Queue one encoded frame. Never blocks.
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// State machine
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle of a single transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TransportState {
    /// Not yet usable.
    Connecting = 0,
    /// Usable for sends.
    Open = 1,
    /// Gone; may reopen for the socket, never for a peer.
    Closed = 2,
}

impl TransportState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Open,
            2 => Self::Closed,
            _ => Self::Connecting,
        }
    }
}

/// Atomic holder of a [`TransportState`].
#[derive(Debug)]
pub struct TransportStateCell(AtomicU8);

impl TransportStateCell {
    /// Cell starting in `initial`.
    pub fn new(initial: TransportState) -> Self {
        Self(AtomicU8::new(initial as u8))
    }

    /// Current state.
    pub fn get(&self) -> TransportState {
        TransportState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next`; returns `true` only if the state actually changed.
    pub fn transition(&self, next: TransportState) -> bool {
        self.0.swap(next as u8, Ordering::AcqRel) != next as u8
    }

    /// Whether the state is [`TransportState::Open`].
    pub fn is_open(&self) -> bool {
        self.get() == TransportState::Open
    }
}

impl Default for TransportStateCell {
    fn default() -> Self {
        Self::new(TransportState::Connecting)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Anything a transport reports to the client.
#[derive(Debug)]
pub enum TransportEvent {
    /// From the WebSocket.
    Socket(SocketEvent),
    /// From one peer channel.
    Peer {
        /// Which peer.
        socket_id: SocketId,
        /// What happened.
        event: PeerEvent,
    },
}

/// WebSocket lifecycle and inbound frames.
#[derive(Debug)]
pub enum SocketEvent {
    /// A connection was established.
    Opened,
    /// The connection dropped.
    Closed,
    /// One raw inbound frame, not yet decoded.
    Message(Vec<u8>),
}

/// Peer channel lifecycle and already-decoded traffic.
#[derive(Debug)]
pub enum PeerEvent {
    /// The data channel opened.
    Connected,
    /// The data channel closed.
    Disconnected,
    /// A decoded inbound message.
    Received(SocketMessage),
    /// A fault on this channel.
    ClientError(ClientError),
    /// A locally gathered ICE candidate to forward to the domain.
    LocalCandidate(Option<IceCandidate>),
}
