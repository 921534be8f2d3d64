//! The domain client: one handle over every transport to the domain.
//!
//! [`DomainClient`] owns the socket, the negotiated peer channels, the
//! pending-request map and the aggregate connection state. A single dispatch
//! loop ([`DomainClient::run`]) drains [`TransportEvent`]s in arrival order;
//! requests pick the best open transport, register a correlation key and wait
//! for the matching response under their own timeout.

pub mod pending;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use audiocloud_core::codec;
use audiocloud_core::constants::DATA_CHANNEL_LABEL;
use audiocloud_core::errors::{ClientError, TransportError};
use audiocloud_core::ids::{SecureKey, SocketId, TaskId};
use audiocloud_core::protocol::{
    CorrelationKey, DesiredTaskPlayState, IceCandidate, IceServer, ModifyTaskSpec,
    PeerConnectionAnswer, RequestBody, SessionDescription, SocketMessage, SocketRequest,
};
use audiocloud_settings::DomainSettings;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::subscriber::{DomainSubscriber, NoopSubscriber};
use crate::transport::peer::{
    ChannelEvent, DataChannel, PeerChannel, PeerConnector, PeerTransport, PeerTransportHelper,
};
use crate::transport::socket::SocketTransport;
use crate::transport::{
    PeerEvent, SocketEvent, Transport, TransportEvent, TransportState, TransportStateCell,
};

use self::pending::PendingRequests;
use self::state::{ConnectionState, Edge};

/// Per-client tuning.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Time to wait for a correlated response.
    pub request_timeout: Duration,
    /// ICE servers handed to the peer connector.
    pub ice_servers: Vec<IceServer>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&DomainSettings::default())
    }
}

impl From<&DomainSettings> for ClientConfig {
    fn from(settings: &DomainSettings) -> Self {
        Self {
            request_timeout: settings.request_timeout(),
            ice_servers: settings.ice_servers.clone(),
        }
    }
}

/// Builder for a [`DomainClient`] over caller-supplied transports.
pub struct DomainClientBuilder {
    config: ClientConfig,
    subscriber: Arc<dyn DomainSubscriber>,
    connector: Option<Arc<dyn PeerConnector>>,
    cancel: CancellationToken,
}

impl DomainClientBuilder {
    /// Builder with default config, no subscriber and no peer support.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            subscriber: Arc::new(NoopSubscriber),
            connector: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the config.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the subscriber.
    #[must_use]
    pub fn subscriber(mut self, subscriber: Arc<dyn DomainSubscriber>) -> Self {
        self.subscriber = subscriber;
        self
    }

    /// Enable peer connections.
    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn PeerConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Use `cancel` as the client's lifetime token.
    #[must_use]
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Build the client.
    ///
    /// `events` is the sender half of the channel whose receiver is passed to
    /// [`DomainClient::run`]; `socket` reports into the same channel.
    pub fn build(
        self,
        socket: Arc<dyn Transport>,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> DomainClient {
        DomainClient {
            inner: Arc::new(Inner {
                config: self.config,
                subscriber: self.subscriber,
                connector: self.connector,
                cancel: self.cancel,
                socket,
                socket_state: TransportStateCell::default(),
                events,
                peers: RwLock::new(IndexMap::new()),
                pending: PendingRequests::new(),
                state: ConnectionState::new(),
            }),
        }
    }
}

impl Default for DomainClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner {
    config: ClientConfig,
    subscriber: Arc<dyn DomainSubscriber>,
    connector: Option<Arc<dyn PeerConnector>>,
    cancel: CancellationToken,
    socket: Arc<dyn Transport>,
    socket_state: TransportStateCell,
    events: mpsc::UnboundedSender<TransportEvent>,
    peers: RwLock<IndexMap<SocketId, Arc<PeerTransport>>>,
    pending: PendingRequests,
    state: ConnectionState,
}

/// Cloneable handle to a domain connection.
#[derive(Clone)]
pub struct DomainClient {
    inner: Arc<Inner>,
}

impl DomainClient {
    /// Connect to the domain described by `settings`.
    ///
    /// Spawns the socket task and the dispatch loop; must be called from
    /// within a tokio runtime.
    pub fn connect(
        settings: &DomainSettings,
        subscriber: Arc<dyn DomainSubscriber>,
        connector: Option<Arc<dyn PeerConnector>>,
    ) -> audiocloud_settings::Result<Self> {
        let url = settings.socket_url()?;
        let cancel = CancellationToken::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let socket = SocketTransport::spawn(
            url,
            settings.reconnect.backoff(),
            settings.socket.outbound_buffer,
            events_tx.clone(),
            cancel.child_token(),
        );

        let mut builder = DomainClientBuilder::new()
            .config(ClientConfig::from(settings))
            .subscriber(subscriber)
            .cancel_token(cancel);
        if let Some(connector) = connector {
            builder = builder.connector(connector);
        }
        let client = builder.build(socket, events_tx);

        drop(tokio::spawn(client.clone().run(events_rx)));
        Ok(client)
    }

    /// Whether any transport is usable.
    pub fn is_connected(&self) -> bool {
        self.inner.state.get()
    }

    /// Default request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.inner.config.request_timeout
    }

    /// Number of requests awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    /// Socket ids of the registered peers, in negotiation order.
    pub fn peer_ids(&self) -> Vec<SocketId> {
        self.inner.peers.read().keys().cloned().collect()
    }

    // ─── Dispatch ────────────────────────────────────────────────────────

    /// Drain `events` until the channel closes or the client is disposed.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
        loop {
            tokio::select! {
                () = self.inner.cancel.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event);
                }
            }
        }
        debug!("dispatch loop stopped");
    }

    /// Process one transport event.
    pub fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Socket(SocketEvent::Opened) => {
                if self.inner.socket_state.transition(TransportState::Open) {
                    debug!("socket transport open");
                    self.recompute();
                }
            }
            TransportEvent::Socket(SocketEvent::Closed) => {
                if self.inner.socket_state.transition(TransportState::Closed) {
                    debug!("socket transport closed");
                    self.recompute();
                }
            }
            TransportEvent::Socket(SocketEvent::Message(bytes)) => self.on_inbound(&bytes),
            TransportEvent::Peer { socket_id, event } => self.on_peer_event(socket_id, event),
        }
    }

    /// Decode and dispatch one raw inbound frame.
    pub fn on_inbound(&self, bytes: &[u8]) {
        match codec::decode::<SocketMessage>(bytes) {
            Ok(message) => self.dispatch(message),
            Err(err) => {
                warn!(error = %err, len = bytes.len(), "undecodable socket frame");
                self.report(&ClientError::MessageParse(err));
            }
        }
    }

    fn on_peer_event(&self, socket_id: SocketId, event: PeerEvent) {
        match event {
            PeerEvent::Connected => {
                debug!(socket_id = %socket_id, "peer transport connected");
                self.recompute();
            }
            PeerEvent::Disconnected => {
                debug!(socket_id = %socket_id, "peer transport disconnected");
                self.recompute();
            }
            PeerEvent::Received(message) => self.dispatch(message),
            PeerEvent::ClientError(err) => self.report(&err),
            PeerEvent::LocalCandidate(candidate) => {
                let body = RequestBody::SubmitPeerConnectionCandidate {
                    socket_id: socket_id.clone(),
                    candidate,
                };
                if let Err(err) = self.notify(body) {
                    warn!(socket_id = %socket_id, error = %err, "failed to forward local candidate");
                }
            }
        }
    }

    fn dispatch(&self, message: SocketMessage) {
        match message {
            SocketMessage::TaskEvent { task_id, event } => {
                self.inner.subscriber.on_task_event(&task_id, &event);
            }
            SocketMessage::PeerConnectionCandidate {
                socket_id,
                candidate,
            } => {
                let peer = self.inner.peers.read().get(&socket_id).cloned();
                match peer {
                    Some(peer) => drop(peer.add_ice_candidate(candidate)),
                    None => warn!(socket_id = %socket_id, "candidate for unknown peer, dropping"),
                }
            }
            response => {
                let Some(key) = response.correlation_key() else {
                    return;
                };
                if !self.inner.pending.resolve(&key, response) {
                    debug!(key = %key, "response without pending request, dropping");
                    metrics::counter!("domain_responses_dropped_total").increment(1);
                }
            }
        }
    }

    fn recompute(&self) {
        let socket_open = self.inner.socket_state.is_open();
        let peer_open = self.inner.peers.read().values().any(|p| p.connected());
        match self.inner.state.update(socket_open, peer_open) {
            Some(Edge::Connected) => {
                info!(socket_open, peer_open, "connected to domain");
                self.inner.subscriber.on_connected();
            }
            Some(Edge::Disconnected) => {
                info!("disconnected from domain");
                self.inner.subscriber.on_disconnected();
            }
            None => {}
        }
    }

    fn report(&self, error: &ClientError) {
        metrics::counter!("domain_client_errors_total", "kind" => error.kind()).increment(1);
        self.inner.subscriber.on_client_error(error);
    }

    // ─── Sending ─────────────────────────────────────────────────────────

    /// First connected peer in negotiation order, else the socket.
    fn send_frame(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        let peer = self
            .inner
            .peers
            .read()
            .values()
            .find(|p| p.connected())
            .cloned();
        let (transport, result) = match peer {
            Some(peer) => ("peer", peer.send_data(frame)),
            None => ("socket", self.inner.socket.send(frame)),
        };
        debug!(transport, ok = result.is_ok(), "frame sent");
        metrics::counter!("domain_requests_total", "transport" => transport).increment(1);
        result
    }

    /// Send a request and wait up to `timeout` for its correlated response.
    pub async fn request(
        &self,
        body: RequestBody,
        timeout: Duration,
    ) -> Result<SocketMessage, ClientError> {
        let kind = body.kind();
        let Some(response_kind) = kind.response_kind() else {
            return Err(ClientError::Unroutable { kind });
        };
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let request = SocketRequest::new(body);
        let request_id = request.request_id.clone();
        let key = CorrelationKey::new(response_kind, request_id.clone());
        let frame = codec::encode(&request).map_err(ClientError::MessageParse)?;

        let rx = self.inner.pending.register(key.clone());
        if let Err(err) = self.send_frame(frame) {
            let _ = self.inner.pending.remove(&key);
            return Err(err.into());
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) | Err(_) => {
                let _ = self.inner.pending.remove(&key);
                metrics::counter!("domain_request_timeouts_total").increment(1);
                debug!(key = %key, "request timed out");
                Err(ClientError::Timeout { request_id })
            }
        }
    }

    /// Send a message that expects no response.
    pub fn notify(&self, body: RequestBody) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let frame = codec::encode(&SocketRequest::new(body)).map_err(ClientError::MessageParse)?;
        self.send_frame(frame).map_err(ClientError::from)
    }

    // ─── Operations ──────────────────────────────────────────────────────

    /// Start receiving events for `task_id`.
    pub async fn attach_to_task(
        &self,
        task_id: &TaskId,
        secure_key: &SecureKey,
    ) -> Result<(), ClientError> {
        let body = RequestBody::RequestAttachToTask {
            task_id: task_id.clone(),
            secure_key: secure_key.clone(),
        };
        match self.request(body, self.request_timeout()).await? {
            SocketMessage::AttachToTaskResponse { result, .. } => {
                result.into_result().map_err(ClientError::Remote)
            }
            other => Err(ClientError::UnexpectedResponse { kind: other.kind() }),
        }
    }

    /// Stop receiving events for `task_id`.
    pub async fn detach_from_task(&self, task_id: &TaskId) -> Result<(), ClientError> {
        let body = RequestBody::RequestDetachFromTask {
            task_id: task_id.clone(),
        };
        match self.request(body, self.request_timeout()).await? {
            SocketMessage::DetachFromTaskResponse { result, .. } => {
                result.into_result().map_err(ClientError::Remote)
            }
            other => Err(ClientError::UnexpectedResponse { kind: other.kind() }),
        }
    }

    /// Request a play-state transition; returns the new task version.
    pub async fn set_desired_play_state(
        &self,
        task_id: &TaskId,
        desired: DesiredTaskPlayState,
        version: u64,
    ) -> Result<u64, ClientError> {
        let body = RequestBody::RequestSetDesiredPlayState {
            task_id: task_id.clone(),
            desired,
            version,
        };
        match self.request(body, self.request_timeout()).await? {
            SocketMessage::SetDesiredPlayStateResponse { result, .. } => {
                result.into_result().map_err(ClientError::Remote)
            }
            other => Err(ClientError::UnexpectedResponse { kind: other.kind() }),
        }
    }

    /// Apply spec mutations; returns the new task version.
    pub async fn modify_task_spec(
        &self,
        task_id: &TaskId,
        modify_spec: Vec<ModifyTaskSpec>,
        version: u64,
    ) -> Result<u64, ClientError> {
        let body = RequestBody::RequestModifyTaskSpec {
            task_id: task_id.clone(),
            modify_spec,
            version,
        };
        match self.request(body, self.request_timeout()).await? {
            SocketMessage::ModifyTaskSpecResponse { result, .. } => {
                result.into_result().map_err(ClientError::Remote)
            }
            other => Err(ClientError::UnexpectedResponse { kind: other.kind() }),
        }
    }

    /// Negotiate a new peer channel and register it.
    ///
    /// Returns the socket id the domain assigned to the channel.
    pub async fn request_peer_connection(&self) -> Result<SocketId, ClientError> {
        let connector = self
            .inner
            .connector
            .clone()
            .ok_or(ClientError::PeerUnavailable)?;
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let PeerChannel {
            channel,
            events,
            offer,
        } = connector
            .open(DATA_CHANNEL_LABEL, &self.inner.config.ice_servers)
            .await
            .map_err(ClientError::Transport)?;

        let answer = match self.negotiate(channel.as_ref(), offer).await {
            Ok(answer) => answer,
            Err(err) => {
                channel.close().await;
                return Err(err);
            }
        };

        let socket_id = answer.socket_id;
        let peer = Arc::new(PeerTransport::new(
            socket_id.clone(),
            channel,
            events,
            self.forwarder(),
        ));
        let replaced = self.inner.peers.write().insert(socket_id.clone(), peer);
        if let Some(old) = replaced {
            warn!(socket_id = %socket_id, "replacing existing peer transport");
            old.close().await;
        }
        info!(socket_id = %socket_id, "peer transport registered");
        Ok(socket_id)
    }

    async fn negotiate(
        &self,
        channel: &dyn DataChannel,
        offer: SessionDescription,
    ) -> Result<PeerConnectionAnswer, ClientError> {
        let body = RequestBody::RequestPeerConnection { offer };
        let answer = match self.request(body, self.request_timeout()).await? {
            SocketMessage::PeerConnectionResponse { result, .. } => {
                result.into_result().map_err(ClientError::Remote)?
            }
            other => return Err(ClientError::UnexpectedResponse { kind: other.kind() }),
        };
        channel
            .accept_answer(answer.answer.clone())
            .await
            .map_err(ClientError::Transport)?;
        Ok(answer)
    }

    /// Register a peer channel negotiated out of band under `socket_id`.
    ///
    /// A peer already registered under the same id is closed in the background.
    pub fn add_peer(
        &self,
        socket_id: SocketId,
        channel: Arc<dyn DataChannel>,
        events: mpsc::Receiver<ChannelEvent>,
    ) {
        let peer = Arc::new(PeerTransport::new(
            socket_id.clone(),
            channel,
            events,
            self.forwarder(),
        ));
        let replaced = self.inner.peers.write().insert(socket_id.clone(), peer);
        if let Some(old) = replaced {
            warn!(socket_id = %socket_id, "replacing existing peer transport");
            drop(tokio::spawn(async move { old.close().await }));
        }
    }

    fn forwarder(&self) -> Arc<dyn PeerTransportHelper> {
        Arc::new(EventForwarder {
            events: self.inner.events.clone(),
        })
    }

    /// Close and forget one peer; returns `false` if it was unknown.
    pub async fn close_peer(&self, socket_id: &SocketId) -> bool {
        let removed = self.inner.peers.write().shift_remove(socket_id);
        match removed {
            Some(peer) => {
                peer.close().await;
                true
            }
            None => false,
        }
    }

    /// Stop reconnecting, close every peer and stop the dispatch loop.
    ///
    /// Requests still in flight end with their own timeout.
    pub async fn dispose(&self) {
        self.inner.cancel.cancel();
        let peers: Vec<Arc<PeerTransport>> = self
            .inner
            .peers
            .write()
            .drain(..)
            .map(|(_, peer)| peer)
            .collect();
        for peer in peers {
            peer.close().await;
        }
        let _ = self.inner.socket_state.transition(TransportState::Closed);
        self.recompute();
        info!("domain client disposed");
    }
}

/// Forwards peer callbacks into the dispatch loop.
struct EventForwarder {
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl EventForwarder {
    fn forward(&self, socket_id: &SocketId, event: PeerEvent) {
        let _ = self.events.send(TransportEvent::Peer {
            socket_id: socket_id.clone(),
            event,
        });
    }
}

impl PeerTransportHelper for EventForwarder {
    fn on_connected(&self, socket_id: &SocketId) {
        self.forward(socket_id, PeerEvent::Connected);
    }

    fn on_disconnected(&self, socket_id: &SocketId) {
        self.forward(socket_id, PeerEvent::Disconnected);
    }

    fn on_response_received(&self, socket_id: &SocketId, message: SocketMessage) {
        self.forward(socket_id, PeerEvent::Received(message));
    }

    fn on_client_error(&self, socket_id: &SocketId, error: ClientError) {
        self.forward(socket_id, PeerEvent::ClientError(error));
    }

    fn on_local_candidate(&self, socket_id: &SocketId, candidate: Option<IceCandidate>) {
        self.forward(socket_id, PeerEvent::LocalCandidate(candidate));
    }
}
