//! Outbound request envelopes.
//!
//! Every request travels as `{type, request_id, ...fields}`: the request id is
//! carried by [`SocketRequest`] and the `type` tag plus fields by the flattened
//! [`RequestBody`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::message::MessageKind;
use super::peer::{IceCandidate, SessionDescription};
use super::task::{DesiredTaskPlayState, ModifyTaskSpec};
use crate::ids::{RequestId, SecureKey, SocketId, TaskId};

/// A request as sent over a transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocketRequest {
    /// Correlation token, fresh per request.
    pub request_id: RequestId,
    /// Request kind and its fields.
    #[serde(flatten)]
    pub body: RequestBody,
}

impl SocketRequest {
    /// Wrap a body with a fresh request id.
    pub fn new(body: RequestBody) -> Self {
        Self {
            request_id: RequestId::new(),
            body,
        }
    }

    /// Kind of the wrapped body.
    pub fn kind(&self) -> RequestKind {
        self.body.kind()
    }
}

/// Everything a client can ask of the domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestBody {
    /// Start receiving events for a task.
    RequestAttachToTask {
        /// Task to attach to.
        task_id: TaskId,
        /// Credential for the task.
        secure_key: SecureKey,
    },
    /// Stop receiving events for a task.
    RequestDetachFromTask {
        /// Task to detach from.
        task_id: TaskId,
    },
    /// Apply a batch of spec mutations at a known version.
    RequestModifyTaskSpec {
        /// Target task.
        task_id: TaskId,
        /// Mutations, applied in order.
        modify_spec: Vec<ModifyTaskSpec>,
        /// Version the client last observed.
        version: u64,
    },
    /// Move a task into a new play state at a known version.
    RequestSetDesiredPlayState {
        /// Target task.
        task_id: TaskId,
        /// Requested state.
        desired: DesiredTaskPlayState,
        /// Version the client last observed.
        version: u64,
    },
    /// Open a peer data channel to the domain.
    RequestPeerConnection {
        /// Local session description.
        offer: SessionDescription,
    },
    /// Forward a locally gathered ICE candidate (no response).
    SubmitPeerConnectionCandidate {
        /// Peer channel the candidate belongs to.
        socket_id: SocketId,
        /// The candidate; `None` marks end of gathering.
        candidate: Option<IceCandidate>,
    },
}

impl RequestBody {
    /// Discriminant of this body.
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::RequestAttachToTask { .. } => RequestKind::AttachToTask,
            Self::RequestDetachFromTask { .. } => RequestKind::DetachFromTask,
            Self::RequestModifyTaskSpec { .. } => RequestKind::ModifyTaskSpec,
            Self::RequestSetDesiredPlayState { .. } => RequestKind::SetDesiredPlayState,
            Self::RequestPeerConnection { .. } => RequestKind::PeerConnection,
            Self::SubmitPeerConnectionCandidate { .. } => RequestKind::SubmitPeerConnectionCandidate,
        }
    }
}

/// Fieldless discriminant of [`RequestBody`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// `request_attach_to_task`
    AttachToTask,
    /// `request_detach_from_task`
    DetachFromTask,
    /// `request_modify_task_spec`
    ModifyTaskSpec,
    /// `request_set_desired_play_state`
    SetDesiredPlayState,
    /// `request_peer_connection`
    PeerConnection,
    /// `submit_peer_connection_candidate`
    SubmitPeerConnectionCandidate,
}

impl RequestKind {
    /// The response kind that answers this request, if it is answered at all.
    ///
    /// The table is injective: no two request kinds share a response kind.
    pub fn response_kind(self) -> Option<MessageKind> {
        match self {
            Self::AttachToTask => Some(MessageKind::AttachToTaskResponse),
            Self::DetachFromTask => Some(MessageKind::DetachFromTaskResponse),
            Self::ModifyTaskSpec => Some(MessageKind::ModifyTaskSpecResponse),
            Self::SetDesiredPlayState => Some(MessageKind::SetDesiredPlayStateResponse),
            Self::PeerConnection => Some(MessageKind::PeerConnectionResponse),
            Self::SubmitPeerConnectionCandidate => None,
        }
    }

    /// Wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AttachToTask => "request_attach_to_task",
            Self::DetachFromTask => "request_detach_from_task",
            Self::ModifyTaskSpec => "request_modify_task_spec",
            Self::SetDesiredPlayState => "request_set_desired_play_state",
            Self::PeerConnection => "request_peer_connection",
            Self::SubmitPeerConnectionCandidate => "submit_peer_connection_candidate",
        }
    }

    /// All request kinds.
    pub const ALL: [Self; 6] = [
        Self::AttachToTask,
        Self::DetachFromTask,
        Self::ModifyTaskSpec,
        Self::SetDesiredPlayState,
        Self::PeerConnection,
        Self::SubmitPeerConnectionCandidate,
    ];
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
