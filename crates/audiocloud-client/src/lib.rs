//! # audiocloud-client
//!
//! Real-time client for an audiocloud domain.
//!
//! - [`DomainClient`]: owns every transport to the domain, correlates
//!   requests with responses and routes task events to a [`DomainSubscriber`]
//! - [`SocketTransport`]: reconnecting WebSocket over `tokio-tungstenite`
//! - [`PeerTransport`]: one negotiated peer data channel, driven through the
//!   [`PeerConnector`] / [`DataChannel`] boundary
//! - [`TaskClient`]: coalesces parameter edits for one task and serializes its
//!   version-tracked mutations
//!
//! [`SocketTransport`]: transport::socket::SocketTransport
//! [`PeerTransport`]: transport::peer::PeerTransport
//! [`PeerConnector`]: transport::peer::PeerConnector
//! [`DataChannel`]: transport::peer::DataChannel

#![deny(unsafe_code)]

pub mod aggregator;
pub mod subscriber;
pub mod task;
pub mod transport;

pub use aggregator::{ClientConfig, DomainClient, DomainClientBuilder};
pub use subscriber::{DomainSubscriber, NoopSubscriber};
pub use task::TaskClient;
