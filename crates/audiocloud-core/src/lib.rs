//! # audiocloud-core
//!
//! Foundation types, wire protocol, codec, and errors for the audiocloud
//! domain client.
//!
//! This crate provides the shared vocabulary the client crates depend on:
//!
//! - **Branded IDs**: `RequestId`, `TaskId`, `SocketId`, ... as newtypes for type safety
//! - **Remote results**: [`RemoteResult`], the `{ok}` / `{error}` container carried by responses
//! - **Protocol**: outbound [`SocketRequest`]s and inbound [`SocketMessage`]s, with the
//!   fixed request → response kind table used for correlation
//! - **Parameters**: typed parameter values and the per-task [`ParameterSchema`]
//! - **Codec**: `MessagePack` encode/decode via `rmp-serde`
//! - **Errors**: [`ClientError`] hierarchy via `thiserror`
//!
//! [`RemoteResult`]: result::RemoteResult
//! [`SocketRequest`]: protocol::SocketRequest
//! [`SocketMessage`]: protocol::SocketMessage
//! [`ParameterSchema`]: params::ParameterSchema
//! [`ClientError`]: errors::ClientError

#![deny(unsafe_code)]

pub mod codec;
pub mod constants;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod params;
pub mod protocol;
pub mod result;
pub mod retry;

pub use errors::{ClientError, CodecError, DomainError, TransportError};
pub use result::RemoteResult;
