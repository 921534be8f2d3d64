//! Aggregate connectivity across all transports.

use std::sync::atomic::{AtomicBool, Ordering};

/// A change of the aggregate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// Went from no usable transport to at least one.
    Connected,
    /// Lost the last usable transport.
    Disconnected,
}

/// `true` iff the socket is open or any peer is connected.
#[derive(Debug, Default)]
pub struct ConnectionState {
    connected: AtomicBool,
}

impl ConnectionState {
    /// Starts disconnected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value.
    pub fn get(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Store the freshly computed value and report an edge if it flipped.
    pub fn update(&self, socket_open: bool, any_peer_connected: bool) -> Option<Edge> {
        let now = socket_open || any_peer_connected;
        let was = self.connected.swap(now, Ordering::AcqRel);
        match (was, now) {
            (false, true) => Some(Edge::Connected),
            (true, false) => Some(Edge::Disconnected),
            _ => None,
        }
    }
}
