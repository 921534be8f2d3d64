//! Reconnecting WebSocket to the domain.
//!
//! One background task owns the connection. It emits [`SocketEvent::Opened`]
//! after each successful connect, forwards inbound frames as raw bytes, writes
//! outbound frames from a bounded queue and emits [`SocketEvent::Closed`] when
//! the connection drops. Reconnects back off exponentially with jitter until
//! the cancellation token fires.

use std::sync::Arc;

use audiocloud_core::errors::TransportError;
use audiocloud_core::retry::Backoff;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{SocketEvent, Transport, TransportEvent, TransportState, TransportStateCell};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a single connection ended.
enum Disconnect {
    Cancelled,
    Dropped,
}

/// Handle to the socket task.
pub struct SocketTransport {
    outbound: mpsc::Sender<Vec<u8>>,
    state: Arc<TransportStateCell>,
    task: JoinHandle<()>,
}

impl SocketTransport {
    /// Start connecting to `url` in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        url: String,
        backoff: Backoff,
        outbound_buffer: usize,
        events: mpsc::UnboundedSender<TransportEvent>,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        let (outbound, outbound_rx) = mpsc::channel(outbound_buffer.max(1));
        let state = Arc::new(TransportStateCell::default());
        let task = tokio::spawn(connection_loop(
            url,
            backoff,
            outbound_rx,
            events,
            state.clone(),
            cancel,
        ));
        Arc::new(Self {
            outbound,
            state,
            task,
        })
    }

    /// Current state of the connection.
    pub fn state(&self) -> TransportState {
        self.state.get()
    }

    /// Whether the background task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Transport for SocketTransport {
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        if !self.state.is_open() {
            return Err(TransportError::Closed);
        }
        self.outbound.try_send(frame).map_err(|err| match err {
            TrySendError::Full(_) => TransportError::Busy,
            TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}

impl Drop for SocketTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn connection_loop(
    url: String,
    mut backoff: Backoff,
    mut outbound: mpsc::Receiver<Vec<u8>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    state: Arc<TransportStateCell>,
    cancel: CancellationToken,
) {
    loop {
        let connected = tokio::select! {
            () = cancel.cancelled() => break,
            result = connect_async(url.as_str()) => result,
        };

        match connected {
            Ok((ws, _)) => {
                backoff.reset();
                if state.transition(TransportState::Open) {
                    info!(%url, "socket connected");
                    let _ = events.send(TransportEvent::Socket(SocketEvent::Opened));
                }

                let ended = run_connection(ws, &mut outbound, &events, &cancel).await;

                if state.transition(TransportState::Closed) {
                    info!(%url, "socket disconnected");
                    let _ = events.send(TransportEvent::Socket(SocketEvent::Closed));
                }
                // Frames queued for the dead connection are stale.
                while outbound.try_recv().is_ok() {}

                if matches!(ended, Disconnect::Cancelled) {
                    break;
                }
            }
            Err(err) => {
                warn!(%url, error = %err, attempt = backoff.attempt(), "socket connect failed");
            }
        }

        let delay = backoff.next_delay(rand::random::<f64>());
        metrics::counter!("domain_socket_reconnects_total").increment(1);
        debug!(delay_ms = delay.as_millis(), "scheduling socket reconnect");
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    let _ = state.transition(TransportState::Closed);
}

async fn run_connection(
    ws: WsStream,
    outbound: &mut mpsc::Receiver<Vec<u8>>,
    events: &mpsc::UnboundedSender<TransportEvent>,
    cancel: &CancellationToken,
) -> Disconnect {
    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                return Disconnect::Cancelled;
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    return Disconnect::Cancelled;
                };
                if let Err(err) = ws_tx.send(Message::binary(frame)).await {
                    warn!(error = %err, "socket write failed");
                    return Disconnect::Dropped;
                }
            }
            msg = ws_rx.next() => {
                let bytes = match msg {
                    Some(Ok(Message::Binary(bytes))) => bytes.to_vec(),
                    Some(Ok(Message::Text(text))) => text.as_str().as_bytes().to_vec(),
                    Some(Ok(Message::Close(_))) | None => return Disconnect::Dropped,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        warn!(error = %err, "socket read failed");
                        return Disconnect::Dropped;
                    }
                };
                let _ = events.send(TransportEvent::Socket(SocketEvent::Message(bytes)));
            }
        }
    }
}
