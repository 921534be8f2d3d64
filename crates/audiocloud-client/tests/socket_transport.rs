//! Socket transport against a real local WebSocket server.

use std::sync::Arc;
use std::time::Duration;

use audiocloud_client::transport::socket::SocketTransport;
use audiocloud_client::transport::{SocketEvent, Transport, TransportEvent, TransportState};
use audiocloud_client::{DomainClient, NoopSubscriber};
use audiocloud_core::codec;
use audiocloud_core::errors::TransportError;
use audiocloud_core::ids::{SecureKey, TaskId};
use audiocloud_core::protocol::{RequestBody, SocketMessage, SocketRequest};
use audiocloud_core::result::RemoteResult;
use audiocloud_core::retry::Backoff;
use audiocloud_settings::DomainSettings;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("ws://{addr}/ws"))
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("no connection arrived")
        .unwrap();
    accept_async(stream).await.unwrap()
}

fn fast_backoff() -> Backoff {
    Backoff::new(10, 50, 0.0)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> SocketEvent {
    match tokio::time::timeout(WAIT, rx.recv()).await {
        Ok(Some(TransportEvent::Socket(event))) => event,
        other => panic!("expected a socket event, got {other:?}"),
    }
}

#[tokio::test]
async fn opens_then_exchanges_binary_frames() {
    let (listener, url) = listen().await;
    let (events, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let socket = SocketTransport::spawn(url, fast_backoff(), 8, events, cancel.clone());

    let mut server = accept(&listener).await;
    assert!(matches!(next_event(&mut rx).await, SocketEvent::Opened));
    assert_eq!(socket.state(), TransportState::Open);

    socket.send(b"ping".to_vec()).unwrap();
    let received = tokio::time::timeout(WAIT, server.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(received.into_data().to_vec(), b"ping".to_vec());

    server.send(Message::binary(b"pong".to_vec())).await.unwrap();
    match next_event(&mut rx).await {
        SocketEvent::Message(bytes) => assert_eq!(bytes, b"pong".to_vec()),
        other => panic!("expected a message, got {other:?}"),
    }

    cancel.cancel();
}

#[tokio::test]
async fn reconnects_after_the_server_drops_the_connection() {
    let (listener, url) = listen().await;
    let (events, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let socket = SocketTransport::spawn(url, fast_backoff(), 8, events, cancel.clone());

    let server = accept(&listener).await;
    assert!(matches!(next_event(&mut rx).await, SocketEvent::Opened));

    drop(server);
    assert!(matches!(next_event(&mut rx).await, SocketEvent::Closed));
    assert_eq!(socket.send(b"late".to_vec()), Err(TransportError::Closed));

    let _server = accept(&listener).await;
    assert!(matches!(next_event(&mut rx).await, SocketEvent::Opened));
    assert_eq!(socket.state(), TransportState::Open);

    cancel.cancel();
}

#[tokio::test]
async fn sends_before_open_fail_and_cancel_stops_the_task() {
    // Reserve a port, then free it so nothing is listening.
    let (listener, url) = listen().await;
    drop(listener);

    let (events, _rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let socket = SocketTransport::spawn(url, fast_backoff(), 8, events, cancel.clone());

    assert_eq!(socket.send(b"early".to_vec()), Err(TransportError::Closed));
    assert_eq!(socket.state(), TransportState::Connecting);

    cancel.cancel();
    tokio::time::timeout(WAIT, async {
        while !socket.is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("socket task did not stop");
    assert_eq!(socket.state(), TransportState::Closed);
}

#[tokio::test]
async fn connected_client_round_trips_a_request() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        while let Some(Ok(msg)) = ws.next().await {
            if !msg.is_binary() {
                continue;
            }
            let request: SocketRequest = codec::decode(&msg.into_data()).unwrap();
            let RequestBody::RequestAttachToTask { task_id, .. } = &request.body else {
                panic!("unexpected request {:?}", request.body);
            };
            assert_eq!(task_id.as_str(), "task-1");
            let reply = SocketMessage::AttachToTaskResponse {
                request_id: request.request_id,
                result: RemoteResult::Ok(()),
            };
            ws.send(Message::binary(codec::encode(&reply).unwrap()))
                .await
                .unwrap();
        }
    });

    let settings = DomainSettings {
        public_url: format!("http://{addr}/"),
        ..DomainSettings::default()
    };
    let client = DomainClient::connect(&settings, Arc::new(NoopSubscriber), None).unwrap();

    tokio::time::timeout(WAIT, async {
        while !client.is_connected() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("client never connected");

    client
        .attach_to_task(&TaskId::from("task-1"), &SecureKey::from("key"))
        .await
        .unwrap();
    assert_eq!(client.pending_requests(), 0);

    client.dispose().await;
    assert!(!client.is_connected());
    server.abort();
}
