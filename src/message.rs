//! Wire protocol definitions
//!
//! JSON-based message protocol using Serde's tagged enum for type-safe
//! serialization/deserialization. Frames are flat objects discriminated by a
//! camelCase `type` field.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Client → Server intent
///
/// All frames this client can emit. Uses tagged enum with camelCase naming.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundIntent {
    /// Bind a display name to the connection (first frame of every session)
    SetUsername { username: String },
    /// Send a chat message to the current room
    Chat { content: String },
    /// Announce that the user started typing
    Typing { username: String },
}

/// Server → Client event
///
/// All frames this client understands. Unknown `type` values fail decoding;
/// extra fields inside a known frame are ignored (the server serializes
/// empty fields on every message).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Chat message from a room member (receipt time is stamped locally)
    Chat { username: String, content: String },
    /// Full membership list for the current room
    UserList { users: Vec<String> },
    /// A room member started typing
    Typing { username: String },
    /// Server-side error report
    Error { content: String },
    /// A new room was created somewhere on the server
    RoomAdded { content: String },
}

/// Serialize an outbound intent into a wire frame.
pub fn encode(intent: &OutboundIntent) -> Result<String, AppError> {
    Ok(serde_json::to_string(intent)?)
}

/// Parse a wire frame into a typed inbound event.
///
/// Fails with `MalformedFrame` when the payload is not the envelope shape or
/// carries an unrecognized `type`. Callers discard the frame; a decode
/// failure never terminates the session.
pub fn decode(frame: &str) -> Result<InboundEvent, AppError> {
    Ok(serde_json::from_str(frame)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_set_username() {
        let frame = encode(&OutboundIntent::SetUsername {
            username: "alice".to_string(),
        })
        .unwrap();
        assert!(frame.contains("\"type\":\"setUsername\""));
        assert!(frame.contains("\"username\":\"alice\""));
    }

    #[test]
    fn test_encode_chat() {
        let frame = encode(&OutboundIntent::Chat {
            content: "hi".to_string(),
        })
        .unwrap();
        assert!(frame.contains("\"type\":\"chat\""));
        assert!(frame.contains("\"content\":\"hi\""));
    }

    #[test]
    fn test_decode_chat_event() {
        let event = decode(r#"{"type":"chat","username":"bob","content":"yo"}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::Chat {
                username: "bob".to_string(),
                content: "yo".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_user_list() {
        let event = decode(r#"{"type":"userList","users":["alice","bob"]}"#).unwrap();
        match event {
            InboundEvent::UserList { users } => assert_eq!(users, ["alice", "bob"]),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_decode_ignores_extra_fields() {
        // The server serializes every envelope field on every message.
        let event =
            decode(r#"{"type":"typing","username":"bob","content":"","users":null}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::Typing {
                username: "bob".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert!(matches!(
            decode(r#"{"type":"presence","username":"bob"}"#),
            Err(AppError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode("not a frame"),
            Err(AppError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_typing_round_trip() {
        let frame = encode(&OutboundIntent::Typing {
            username: "alice".to_string(),
        })
        .unwrap();
        let event = decode(&frame).unwrap();
        assert_eq!(
            event,
            InboundEvent::Typing {
                username: "alice".to_string(),
            }
        );
    }
}
