//! Task-level payloads: play state, spec mutations, and lifecycle events.

use serde::{Deserialize, Serialize};

use crate::ids::{DynamicInstanceNodeId, FixedInstanceNodeId, MediaObjectId, MixerId};
use crate::params::{ParameterTarget, ParameterValues};

/// A time range within a task's timeline, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSegment {
    /// Start of the segment.
    pub start: f64,
    /// Length of the segment.
    pub length: f64,
}

/// Parameters of a playback request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayTask {
    /// Mixer whose output is streamed.
    pub mixer_id: MixerId,
    /// Timeline segment to play.
    pub segment: TimeSegment,
    /// Whether playback loops over the segment.
    pub looping: bool,
    /// Position within the segment to start from.
    pub start_at: f64,
    /// Stream sample rate in Hz.
    pub sample_rate: u32,
    /// Stream bit depth.
    pub bit_depth: u32,
}

/// Parameters of a render request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderTask {
    /// Mixer whose output is rendered.
    pub mixer_id: MixerId,
    /// Timeline segment to render.
    pub segment: TimeSegment,
    /// Media object the render is written to.
    pub object_id: MediaObjectId,
}

/// The play state a client asks the domain to move a task into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesiredTaskPlayState {
    /// Stream the mixer output.
    Play(PlayTask),
    /// Render the mixer output to a media object.
    Render(RenderTask),
    /// Stop any playback or render.
    Stopped,
}

/// The play state a task reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPlayState {
    /// Idle.
    Stopped,
    /// Getting ready to play or render.
    Preparing,
    /// Streaming audio.
    Playing,
    /// Rendering to a media object.
    Rendering,
    /// Winding down.
    Stopping,
}

/// Coalescing discriminant of a [`ModifyTaskSpec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModifyTaskSpecKind {
    /// Parameter edit on a fixed instance.
    FixedInstanceParameters,
    /// Parameter edit on a dynamic instance.
    DynamicInstanceParameters,
}

/// One instruction mutating a running task's specification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifyTaskSpec {
    /// Set parameter values on a fixed instance node.
    SetFixedInstanceParameterValues {
        /// Target node.
        fixed_id: FixedInstanceNodeId,
        /// Parameter values to set.
        values: ParameterValues,
    },
    /// Set parameter values on a dynamic instance node.
    SetDynamicInstanceParameterValues {
        /// Target node.
        dynamic_id: DynamicInstanceNodeId,
        /// Parameter values to set.
        values: ParameterValues,
    },
}

impl ModifyTaskSpec {
    /// Build the parameter command addressed to `target`.
    pub fn set_parameters(target: ParameterTarget, values: ParameterValues) -> Self {
        match target {
            ParameterTarget::Fixed(fixed_id) => {
                Self::SetFixedInstanceParameterValues { fixed_id, values }
            }
            ParameterTarget::Dynamic(dynamic_id) => {
                Self::SetDynamicInstanceParameterValues { dynamic_id, values }
            }
        }
    }

    /// The `(kind, target id)` pair under which repeated edits coalesce.
    pub fn coalesce_key(&self) -> (ModifyTaskSpecKind, &str) {
        match self {
            Self::SetFixedInstanceParameterValues { fixed_id, .. } => {
                (ModifyTaskSpecKind::FixedInstanceParameters, fixed_id.as_str())
            }
            Self::SetDynamicInstanceParameterValues { dynamic_id, .. } => {
                (ModifyTaskSpecKind::DynamicInstanceParameters, dynamic_id.as_str())
            }
        }
    }

    /// Merge a later command for the same key into this one.
    ///
    /// Field-by-field, last write wins. Returns `other` back untouched if the
    /// keys differ.
    pub fn merge(&mut self, other: Self) -> Result<(), Self> {
        if self.coalesce_key() != other.coalesce_key() {
            return Err(other);
        }
        match (self, other) {
            (
                Self::SetFixedInstanceParameterValues { values, .. },
                Self::SetFixedInstanceParameterValues { values: newer, .. },
            )
            | (
                Self::SetDynamicInstanceParameterValues { values, .. },
                Self::SetDynamicInstanceParameterValues { values: newer, .. },
            ) => {
                values.extend(newer);
                Ok(())
            }
            (_, other) => Err(other),
        }
    }
}

/// Unsolicited lifecycle event of an attached task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// The task's play state changed.
    PlayStateChanged {
        /// New state.
        state: TaskPlayState,
    },
    /// The task's specification changed on the domain.
    SpecChanged {
        /// Version after the change.
        version: u64,
    },
    /// A chunk of streamed audio.
    StreamingPacket {
        /// Monotonic packet serial.
        serial: u64,
        /// Encoded audio payload, carried as msgpack `bin`.
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
    /// A render completed.
    RenderFinished {
        /// Media object written by the render.
        object_id: MediaObjectId,
    },
    /// The task reported an error.
    Error {
        /// Human-readable description.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ParameterId;

    fn fixed(id: &str, pairs: &[(&str, f64)]) -> ModifyTaskSpec {
        ModifyTaskSpec::set_parameters(
            ParameterTarget::Fixed(id.into()),
            pairs
                .iter()
                .map(|(k, v)| (ParameterId::from(*k), (*v).into()))
                .collect(),
        )
    }

    #[test]
    fn merge_overwrites_per_field() {
        let mut a = fixed("nodeA", &[("gain", 1.0)]);
        a.merge(fixed("nodeA", &[("gain", 2.0), ("pan", 0.0)])).unwrap();
        assert_eq!(a, fixed("nodeA", &[("gain", 2.0), ("pan", 0.0)]));
    }

    #[test]
    fn merge_rejects_other_target() {
        let mut a = fixed("nodeA", &[("gain", 1.0)]);
        let b = fixed("nodeB", &[("gain", 2.0)]);
        assert_eq!(a.merge(b.clone()), Err(b));
    }

    #[test]
    fn same_id_different_kind_does_not_merge() {
        let mut a = fixed("node", &[("gain", 1.0)]);
        let b = ModifyTaskSpec::set_parameters(
            ParameterTarget::Dynamic("node".into()),
            [(ParameterId::from("gain"), 2.0.into())].into_iter().collect(),
        );
        assert!(a.merge(b).is_err());
    }

    #[test]
    fn desired_play_state_wire_shape() {
        let stopped = serde_json::to_value(DesiredTaskPlayState::Stopped).unwrap();
        assert_eq!(stopped, serde_json::json!("stopped"));
    }

    #[test]
    fn task_event_is_internally_tagged() {
        let event = TaskEvent::SpecChanged { version: 3 };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({"type": "spec_changed", "version": 3})
        );
    }
}
