//! Inbound messages and correlation keys.
//!
//! Correlated responses carry `{type, request_id, result}`. Task events and
//! peer-negotiation candidates carry no request id and are dispatched
//! unsolicited.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::peer::{IceCandidate, PeerConnectionAnswer};
use super::task::TaskEvent;
use crate::errors::DomainError;
use crate::ids::{RequestId, SocketId, TaskId};
use crate::result::RemoteResult;

/// Anything the domain sends to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SocketMessage {
    /// Lifecycle event of an attached task.
    TaskEvent {
        /// Task the event belongs to.
        task_id: TaskId,
        /// The event.
        event: TaskEvent,
    },
    /// Remote ICE candidate for one of our peer channels.
    PeerConnectionCandidate {
        /// Peer channel the candidate belongs to.
        socket_id: SocketId,
        /// The candidate; `None` marks end of gathering.
        candidate: Option<IceCandidate>,
    },
    /// Answer to `request_attach_to_task`.
    AttachToTaskResponse {
        /// Request being answered.
        request_id: RequestId,
        /// Outcome.
        result: RemoteResult<(), DomainError>,
    },
    /// Answer to `request_detach_from_task`.
    DetachFromTaskResponse {
        /// Request being answered.
        request_id: RequestId,
        /// Outcome.
        result: RemoteResult<(), DomainError>,
    },
    /// Answer to `request_modify_task_spec`; carries the new task version.
    ModifyTaskSpecResponse {
        /// Request being answered.
        request_id: RequestId,
        /// Outcome.
        result: RemoteResult<u64, DomainError>,
    },
    /// Answer to `request_set_desired_play_state`; carries the new task version.
    SetDesiredPlayStateResponse {
        /// Request being answered.
        request_id: RequestId,
        /// Outcome.
        result: RemoteResult<u64, DomainError>,
    },
    /// Answer to `request_peer_connection`.
    PeerConnectionResponse {
        /// Request being answered.
        request_id: RequestId,
        /// Outcome.
        result: RemoteResult<PeerConnectionAnswer, DomainError>,
    },
}

impl SocketMessage {
    /// Discriminant of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::TaskEvent { .. } => MessageKind::TaskEvent,
            Self::PeerConnectionCandidate { .. } => MessageKind::PeerConnectionCandidate,
            Self::AttachToTaskResponse { .. } => MessageKind::AttachToTaskResponse,
            Self::DetachFromTaskResponse { .. } => MessageKind::DetachFromTaskResponse,
            Self::ModifyTaskSpecResponse { .. } => MessageKind::ModifyTaskSpecResponse,
            Self::SetDesiredPlayStateResponse { .. } => MessageKind::SetDesiredPlayStateResponse,
            Self::PeerConnectionResponse { .. } => MessageKind::PeerConnectionResponse,
        }
    }

    /// Embedded request id, for correlated responses only.
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::TaskEvent { .. } | Self::PeerConnectionCandidate { .. } => None,
            Self::AttachToTaskResponse { request_id, .. }
            | Self::DetachFromTaskResponse { request_id, .. }
            | Self::ModifyTaskSpecResponse { request_id, .. }
            | Self::SetDesiredPlayStateResponse { request_id, .. }
            | Self::PeerConnectionResponse { request_id, .. } => Some(request_id),
        }
    }

    /// Correlation key of a response, `None` for unsolicited messages.
    pub fn correlation_key(&self) -> Option<CorrelationKey> {
        self.request_id()
            .map(|id| CorrelationKey::new(self.kind(), id.clone()))
    }
}

/// Fieldless discriminant of [`SocketMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `task_event`
    TaskEvent,
    /// `peer_connection_candidate`
    PeerConnectionCandidate,
    /// `attach_to_task_response`
    AttachToTaskResponse,
    /// `detach_from_task_response`
    DetachFromTaskResponse,
    /// `modify_task_spec_response`
    ModifyTaskSpecResponse,
    /// `set_desired_play_state_response`
    SetDesiredPlayStateResponse,
    /// `peer_connection_response`
    PeerConnectionResponse,
}

impl MessageKind {
    /// Wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskEvent => "task_event",
            Self::PeerConnectionCandidate => "peer_connection_candidate",
            Self::AttachToTaskResponse => "attach_to_task_response",
            Self::DetachFromTaskResponse => "detach_from_task_response",
            Self::ModifyTaskSpecResponse => "modify_task_spec_response",
            Self::SetDesiredPlayStateResponse => "set_desired_play_state_response",
            Self::PeerConnectionResponse => "peer_connection_response",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matches an inbound response to the request that triggered it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    /// Expected (or actual) response kind.
    pub kind: MessageKind,
    /// Request id echoed by the response.
    pub request_id: RequestId,
}

impl CorrelationKey {
    /// Build a key.
    pub fn new(kind: MessageKind, request_id: RequestId) -> Self {
        Self { kind, request_id }
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_spec_response_shape() {
        let json = serde_json::json!({
            "type": "set_desired_play_state_response",
            "request_id": "abc",
            "result": {"ok": 7},
        });
        let msg: SocketMessage = serde_json::from_value(json).unwrap();
        assert_eq!(
            msg.correlation_key(),
            Some(CorrelationKey::new(
                MessageKind::SetDesiredPlayStateResponse,
                RequestId::from("abc")
            ))
        );
        let SocketMessage::SetDesiredPlayStateResponse { result, .. } = msg else {
            panic!("wrong variant");
        };
        assert_eq!(result, RemoteResult::Ok(7));
    }

    #[test]
    fn unsolicited_messages_have_no_key() {
        let msg = SocketMessage::TaskEvent {
            task_id: TaskId::from("t"),
            event: TaskEvent::SpecChanged { version: 1 },
        };
        assert!(msg.correlation_key().is_none());
    }

    #[test]
    fn wire_tag_matches_kind() {
        let msg = SocketMessage::PeerConnectionCandidate {
            socket_id: SocketId::from("s"),
            candidate: None,
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], msg.kind().as_str());
    }

    #[test]
    fn same_id_different_kind_are_distinct_keys() {
        let id = RequestId::from("x");
        assert_ne!(
            CorrelationKey::new(MessageKind::AttachToTaskResponse, id.clone()),
            CorrelationKey::new(MessageKind::DetachFromTaskResponse, id)
        );
    }
}
