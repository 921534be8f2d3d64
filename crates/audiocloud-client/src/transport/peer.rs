//! Peer data channels.
//!
//! The WebRTC stack itself stays behind two traits: a [`PeerConnector`]
//! creates a local offer and starts ICE gathering, and the resulting
//! [`DataChannel`] carries frames once the domain's answer is applied.
//! [`PeerTransport`] wraps one negotiated channel, tracks its state and
//! reports everything through a [`PeerTransportHelper`].

use std::sync::Arc;

use async_trait::async_trait;
use audiocloud_core::codec;
use audiocloud_core::errors::{ClientError, TransportError};
use audiocloud_core::ids::SocketId;
use audiocloud_core::protocol::{IceCandidate, IceServer, SessionDescription, SocketMessage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Transport, TransportState, TransportStateCell};

/// One side of a negotiated peer data channel.
#[async_trait]
pub trait DataChannel: Send + Sync {
    /// Write one frame. Never blocks.
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError>;

    /// Apply a remote ICE candidate; `None` marks end of remote gathering.
    async fn add_ice_candidate(&self, candidate: Option<IceCandidate>)
    -> Result<(), TransportError>;

    /// Apply the domain's answer to our offer.
    async fn accept_answer(&self, answer: SessionDescription) -> Result<(), TransportError>;

    /// Tear the channel down.
    async fn close(&self);
}

/// What the channel reports back.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    /// The channel is ready for data.
    Open,
    /// The channel closed.
    Close,
    /// One inbound frame.
    Message(Vec<u8>),
    /// A locally gathered ICE candidate; `None` marks end of gathering.
    LocalCandidate(Option<IceCandidate>),
}

/// A freshly created, not yet answered, peer channel.
pub struct PeerChannel {
    /// The channel handle.
    pub channel: Arc<dyn DataChannel>,
    /// Events raised by the channel; closing the stream counts as [`ChannelEvent::Close`].
    pub events: mpsc::Receiver<ChannelEvent>,
    /// Local session description to send to the domain.
    pub offer: SessionDescription,
}

/// Factory for peer channels.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// Create a data channel named `label` and its offer, gathering against
    /// `ice_servers`.
    async fn open(
        &self,
        label: &str,
        ice_servers: &[IceServer],
    ) -> Result<PeerChannel, TransportError>;
}

/// Callbacks raised by a [`PeerTransport`].
pub trait PeerTransportHelper: Send + Sync {
    /// The channel opened.
    fn on_connected(&self, socket_id: &SocketId);
    /// The channel closed.
    fn on_disconnected(&self, socket_id: &SocketId);
    /// A frame decoded into a message.
    fn on_response_received(&self, socket_id: &SocketId, message: SocketMessage);
    /// A decode or candidate failure.
    fn on_client_error(&self, socket_id: &SocketId, error: ClientError);
    /// A local ICE candidate is ready to be forwarded.
    fn on_local_candidate(&self, socket_id: &SocketId, candidate: Option<IceCandidate>);
}

/// One negotiated peer channel to the domain.
pub struct PeerTransport {
    socket_id: SocketId,
    channel: Arc<dyn DataChannel>,
    state: Arc<TransportStateCell>,
    helper: Arc<dyn PeerTransportHelper>,
    pump: JoinHandle<()>,
}

impl PeerTransport {
    /// Wrap a channel and start pumping its events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        socket_id: SocketId,
        channel: Arc<dyn DataChannel>,
        events: mpsc::Receiver<ChannelEvent>,
        helper: Arc<dyn PeerTransportHelper>,
    ) -> Self {
        let state = Arc::new(TransportStateCell::default());
        let pump = tokio::spawn(pump_events(
            socket_id.clone(),
            events,
            state.clone(),
            helper.clone(),
        ));
        Self {
            socket_id,
            channel,
            state,
            helper,
            pump,
        }
    }

    /// Socket id assigned by the domain.
    pub fn socket_id(&self) -> &SocketId {
        &self.socket_id
    }

    /// Current state.
    pub fn state(&self) -> TransportState {
        self.state.get()
    }

    /// Whether the channel is open.
    pub fn connected(&self) -> bool {
        self.state.is_open()
    }

    /// Raw write of one encoded frame.
    pub fn send_data(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.channel.send(frame)
    }

    /// Apply a remote candidate in the background.
    ///
    /// Failures go to the helper as [`ClientError::IceCandidate`].
    pub fn add_ice_candidate(&self, candidate: Option<IceCandidate>) -> JoinHandle<()> {
        let channel = self.channel.clone();
        let helper = self.helper.clone();
        let socket_id = self.socket_id.clone();
        tokio::spawn(async move {
            if let Err(err) = channel.add_ice_candidate(candidate).await {
                warn!(socket_id = %socket_id, error = %err, "failed to apply ICE candidate");
                helper.on_client_error(&socket_id, ClientError::IceCandidate(err));
            }
        })
    }

    /// Close the channel and stop the pump.
    pub async fn close(&self) {
        self.pump.abort();
        self.channel.close().await;
        if self.state.transition(TransportState::Closed) {
            self.helper.on_disconnected(&self.socket_id);
        }
    }
}

impl Transport for PeerTransport {
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.send_data(frame)
    }
}

impl Drop for PeerTransport {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn pump_events(
    socket_id: SocketId,
    mut events: mpsc::Receiver<ChannelEvent>,
    state: Arc<TransportStateCell>,
    helper: Arc<dyn PeerTransportHelper>,
) {
    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::Open => {
                if state.transition(TransportState::Open) {
                    debug!(socket_id = %socket_id, "peer channel open");
                    helper.on_connected(&socket_id);
                }
            }
            ChannelEvent::Close => {
                if state.transition(TransportState::Closed) {
                    debug!(socket_id = %socket_id, "peer channel closed");
                    helper.on_disconnected(&socket_id);
                }
            }
            ChannelEvent::Message(bytes) => match codec::decode::<SocketMessage>(&bytes) {
                Ok(message) => helper.on_response_received(&socket_id, message),
                Err(err) => {
                    warn!(socket_id = %socket_id, error = %err, "undecodable peer frame");
                    helper.on_client_error(&socket_id, ClientError::MessageParse(err));
                }
            },
            ChannelEvent::LocalCandidate(candidate) => {
                helper.on_local_candidate(&socket_id, candidate);
            }
        }
    }

    if state.transition(TransportState::Closed) {
        debug!(socket_id = %socket_id, "peer event stream ended");
        helper.on_disconnected(&socket_id);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
