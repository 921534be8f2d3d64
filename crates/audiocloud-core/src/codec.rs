//! `MessagePack` wire codec.
//!
//! Structs are written as maps (`to_vec_named`) so tagged enums and optional
//! fields survive the round trip. The client never inspects raw bytes beyond
//! these two functions.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::CodecError;

/// Encode a value into a binary frame.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decode a binary frame into a value.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{RequestId, TaskId};
    use crate::protocol::{RequestBody, SocketMessage, SocketRequest, TaskEvent, TaskPlayState};
    use crate::result::RemoteResult;

    #[test]
    fn request_survives_flattened_tag() {
        let req = SocketRequest {
            request_id: RequestId::from("abc"),
            body: RequestBody::RequestDetachFromTask {
                task_id: TaskId::from("t1"),
            },
        };
        let bytes = encode(&req).unwrap();
        let back: SocketRequest = decode(&bytes).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn nested_tagged_event_decodes() {
        let msg = SocketMessage::TaskEvent {
            task_id: TaskId::from("t1"),
            event: TaskEvent::PlayStateChanged {
                state: TaskPlayState::Playing,
            },
        };
        let back: SocketMessage = decode(&encode(&msg).unwrap()).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn response_with_version_decodes() {
        let msg = SocketMessage::ModifyTaskSpecResponse {
            request_id: RequestId::from("r"),
            result: RemoteResult::Ok(12),
        };
        let back: SocketMessage = decode(&encode(&msg).unwrap()).unwrap();
        assert_eq!(back, msg);
    }

    fn streaming_packet_frame() -> Vec<u8> {
        let mut frame = vec![0x83];
        frame.extend_from_slice(b"\xa4type\xaatask_event");
        frame.extend_from_slice(b"\xa7task_id\xa2t1");
        frame.extend_from_slice(b"\xa5event\x83");
        frame.extend_from_slice(b"\xa4type\xb0streaming_packet");
        frame.extend_from_slice(b"\xa6serial\x01");
        frame.extend_from_slice(b"\xa4data\xc4\x03\x01\x02\x03");
        frame
    }

    #[test]
    fn streaming_payload_decodes_from_bin() {
        let msg: SocketMessage = decode(&streaming_packet_frame()).unwrap();
        assert_eq!(
            msg,
            SocketMessage::TaskEvent {
                task_id: TaskId::from("t1"),
                event: TaskEvent::StreamingPacket {
                    serial: 1,
                    data: vec![1, 2, 3],
                },
            }
        );
    }

    #[test]
    fn streaming_payload_encodes_as_bin() {
        let msg = SocketMessage::TaskEvent {
            task_id: TaskId::from("t1"),
            event: TaskEvent::StreamingPacket {
                serial: 1,
                data: vec![1, 2, 3],
            },
        };
        let bytes = encode(&msg).unwrap();
        assert!(bytes.windows(5).any(|w| w == [0xc4, 0x03, 0x01, 0x02, 0x03]));
        assert_eq!(decode::<SocketMessage>(&bytes).unwrap(), msg);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode::<SocketMessage>(b"\xc1\x00garbage").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
