//! Wire protocol between the client and the domain.
//!
//! - [`request`]: outbound envelopes and the request → response kind table
//! - [`message`]: inbound messages and correlation keys
//! - [`task`]: play state, spec mutations and task events
//! - [`peer`]: peer-connection negotiation payloads

pub mod message;
pub mod peer;
pub mod request;
pub mod task;

pub use message::{CorrelationKey, MessageKind, SocketMessage};
pub use peer::{IceCandidate, IceServer, PeerConnectionAnswer, SdpType, SessionDescription};
pub use request::{RequestBody, RequestKind, SocketRequest};
pub use task::{
    DesiredTaskPlayState, ModifyTaskSpec, ModifyTaskSpecKind, PlayTask, RenderTask, TaskEvent,
    TaskPlayState, TimeSegment,
};
