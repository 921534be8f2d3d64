//! Shared fakes for the client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use audiocloud_client::transport::peer::{ChannelEvent, DataChannel, PeerChannel, PeerConnector};
use audiocloud_client::transport::{SocketEvent, Transport, TransportEvent};
use audiocloud_client::{ClientConfig, DomainClient, DomainClientBuilder, DomainSubscriber};
use audiocloud_core::codec;
use audiocloud_core::errors::{ClientError, TransportError};
use audiocloud_core::ids::TaskId;
use audiocloud_core::protocol::{
    IceCandidate, IceServer, SdpType, SessionDescription, SocketMessage, SocketRequest, TaskEvent,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────────────
// Socket
// ─────────────────────────────────────────────────────────────────────────────

/// Socket stand-in that hands every frame to the test.
pub struct FakeSocket {
    frames: mpsc::UnboundedSender<Vec<u8>>,
    sent: AtomicUsize,
    fail_with: Mutex<Option<TransportError>>,
}

impl FakeSocket {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (frames, rx) = mpsc::unbounded_channel();
        let socket = Arc::new(Self {
            frames,
            sent: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
        });
        (socket, rx)
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, err: TransportError) {
        *self.fail_with.lock() = Some(err);
    }
}

impl Transport for FakeSocket {
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        if let Some(err) = self.fail_with.lock().clone() {
            return Err(err);
        }
        let _ = self.sent.fetch_add(1, Ordering::SeqCst);
        let _ = self.frames.send(frame);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Peer channel
// ─────────────────────────────────────────────────────────────────────────────

/// Data channel stand-in recording everything done to it.
pub struct FakeChannel {
    frames: mpsc::UnboundedSender<Vec<u8>>,
    pub candidates: Mutex<Vec<Option<IceCandidate>>>,
    pub answers: Mutex<Vec<SessionDescription>>,
    pub closed: AtomicUsize,
    pub fail_candidates: AtomicBool,
}

impl FakeChannel {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (frames, rx) = mpsc::unbounded_channel();
        let channel = Arc::new(Self {
            frames,
            candidates: Mutex::new(Vec::new()),
            answers: Mutex::new(Vec::new()),
            closed: AtomicUsize::new(0),
            fail_candidates: AtomicBool::new(false),
        });
        (channel, rx)
    }
}

#[async_trait]
impl DataChannel for FakeChannel {
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.frames
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }

    async fn add_ice_candidate(
        &self,
        candidate: Option<IceCandidate>,
    ) -> Result<(), TransportError> {
        if self.fail_candidates.load(Ordering::SeqCst) {
            return Err(TransportError::Channel("malformed candidate".into()));
        }
        self.candidates.lock().push(candidate);
        Ok(())
    }

    async fn accept_answer(&self, answer: SessionDescription) -> Result<(), TransportError> {
        self.answers.lock().push(answer);
        Ok(())
    }

    async fn close(&self) {
        let _ = self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Pieces of the channel a [`FakeConnector`] handed out.
pub struct OpenedChannel {
    pub channel: Arc<FakeChannel>,
    pub frames: mpsc::UnboundedReceiver<Vec<u8>>,
    pub events: mpsc::Sender<ChannelEvent>,
    pub label: String,
    pub ice_servers: Vec<IceServer>,
}

/// Connector that creates [`FakeChannel`]s and parks their handles for the test.
#[derive(Default)]
pub struct FakeConnector {
    pub opened: Mutex<Vec<OpenedChannel>>,
}

#[async_trait]
impl PeerConnector for FakeConnector {
    async fn open(
        &self,
        label: &str,
        ice_servers: &[IceServer],
    ) -> Result<PeerChannel, TransportError> {
        let (channel, frames) = FakeChannel::new();
        let (events_tx, events_rx) = mpsc::channel(16);
        self.opened.lock().push(OpenedChannel {
            channel: channel.clone(),
            frames,
            events: events_tx,
            label: label.to_string(),
            ice_servers: ice_servers.to_vec(),
        });
        Ok(PeerChannel {
            channel,
            events: events_rx,
            offer: SessionDescription {
                sdp_type: SdpType::Offer,
                sdp: "v=0 offer".into(),
            },
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscriber
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSubscriber {
    pub connected: AtomicUsize,
    pub disconnected: AtomicUsize,
    pub errors: Mutex<Vec<String>>,
    pub task_events: Mutex<Vec<(TaskId, TaskEvent)>>,
}

impl RecordingSubscriber {
    pub fn connected(&self) -> usize {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn disconnected(&self) -> usize {
        self.disconnected.load(Ordering::SeqCst)
    }

    pub fn error_kinds(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl DomainSubscriber for RecordingSubscriber {
    fn on_connected(&self) {
        let _ = self.connected.fetch_add(1, Ordering::SeqCst);
    }

    fn on_disconnected(&self) {
        let _ = self.disconnected.fetch_add(1, Ordering::SeqCst);
    }

    fn on_client_error(&self, error: &ClientError) {
        self.errors.lock().push(error.kind().to_string());
    }

    fn on_task_event(&self, task_id: &TaskId, event: &TaskEvent) {
        self.task_events.lock().push((task_id.clone(), event.clone()));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────────

pub struct Harness {
    pub client: DomainClient,
    pub socket: Arc<FakeSocket>,
    pub frames: mpsc::UnboundedReceiver<Vec<u8>>,
    pub subscriber: Arc<RecordingSubscriber>,
    pub connector: Arc<FakeConnector>,
    pub events: mpsc::UnboundedSender<TransportEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<TransportEvent>>,
}

pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(500);

impl Harness {
    /// Client over a fake socket; the dispatch loop is not running.
    pub fn new() -> Self {
        let (socket, frames) = FakeSocket::new();
        let subscriber = Arc::new(RecordingSubscriber::default());
        let connector = Arc::new(FakeConnector::default());
        let (events, events_rx) = mpsc::unbounded_channel();
        let client = DomainClientBuilder::new()
            .config(ClientConfig {
                request_timeout: REQUEST_TIMEOUT,
                ..ClientConfig::default()
            })
            .subscriber(subscriber.clone())
            .connector(connector.clone())
            .build(socket.clone(), events.clone());
        Self {
            client,
            socket,
            frames,
            subscriber,
            connector,
            events,
            events_rx: Some(events_rx),
        }
    }

    /// Start the dispatch loop in the background.
    pub fn spawn_loop(&mut self) {
        if let Some(rx) = self.events_rx.take() {
            drop(tokio::spawn(self.client.clone().run(rx)));
        }
    }

    /// Mark the socket open, directly.
    pub fn open_socket(&self) {
        self.client
            .handle_event(TransportEvent::Socket(SocketEvent::Opened));
    }

    /// Deliver `message` as an inbound socket frame, directly.
    pub fn deliver(&self, message: &SocketMessage) {
        self.client
            .handle_event(TransportEvent::Socket(SocketEvent::Message(
                codec::encode(message).unwrap(),
            )));
    }

    /// Next request the client wrote to the socket.
    pub async fn next_request(&mut self) -> SocketRequest {
        let frame = tokio::time::timeout(Duration::from_secs(5), self.frames.recv())
            .await
            .expect("timed out waiting for a request")
            .expect("socket frames closed");
        codec::decode(&frame).unwrap()
    }
}

/// Decode a frame written to a fake transport.
pub fn decode_request(frame: &[u8]) -> SocketRequest {
    codec::decode(frame).unwrap()
}

/// Let every runnable task make progress (requires a paused clock).
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
