//! Inbound and outbound WebSocket message type definitions.
//!
//! Frames are JSON text internally tagged by `type`. The camelCase event
//! names used by the web client (`addUser`, `sendMessage`) are accepted as
//! aliases.

use serde::{Deserialize, Serialize};

use roomie_core::types::UserId;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Bind this connection to an application identity.
    #[serde(alias = "addUser")]
    AnnounceIdentity {
        /// Identity being announced.
        #[serde(alias = "userId")]
        user_id: UserId,
    },
    /// Relay a chat message to another user.
    #[serde(alias = "sendMessage")]
    SendChatMessage {
        /// Author.
        #[serde(alias = "senderId")]
        sender_id: UserId,
        /// Recipient.
        #[serde(alias = "receiverId")]
        receiver_id: UserId,
        /// Message body.
        text: String,
    },
    /// Pong response to server ping.
    Pong {
        /// Echoed timestamp.
        #[serde(default)]
        timestamp: i64,
    },
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// The set of announced identities changed.
    OnlineUserListChanged {
        /// Every online identity, sorted.
        user_ids: Vec<UserId>,
    },
    /// A chat message relayed from another user.
    IncomingChatMessage {
        /// Author.
        sender_id: UserId,
        /// Message body.
        text: String,
    },
    /// Ping (server keepalive).
    Ping {
        /// Server timestamp in milliseconds.
        timestamp: i64,
    },
    /// Protocol error for the receiving connection.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// Build an error frame.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Serialize to a JSON text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_snake_case_frames() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"type":"announce_identity","user_id":"u1"}"#).unwrap();
        assert_eq!(
            msg,
            InboundMessage::AnnounceIdentity {
                user_id: UserId::new("u1")
            }
        );
    }

    #[test]
    fn test_parses_legacy_event_names() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"type":"sendMessage","senderId":"a","receiverId":"b","text":"hi"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::SendChatMessage {
                sender_id: UserId::new("a"),
                receiver_id: UserId::new("b"),
                text: "hi".to_string(),
            }
        );

        let msg: InboundMessage =
            serde_json::from_str(r#"{"type":"addUser","userId":"a"}"#).unwrap();
        assert!(matches!(msg, InboundMessage::AnnounceIdentity { .. }));
    }

    #[test]
    fn test_outbound_shape() {
        let json = OutboundMessage::IncomingChatMessage {
            sender_id: UserId::new("a"),
            text: "hello".to_string(),
        }
        .to_json()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "incoming_chat_message");
        assert_eq!(value["sender_id"], "a");
        assert_eq!(value["text"], "hello");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<InboundMessage>(r#"{"type":"subscribe"}"#).is_err());
    }
}
