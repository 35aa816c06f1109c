//! Server-to-client events.
//!
//! The server is authoritative for presence: every membership event carries
//! the full `present_minds` list, and clients replace their view with it
//! rather than applying deltas.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Environment details sent with the `welcome` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    /// Display names of minds currently in the environment.
    #[serde(default)]
    pub present_minds: Vec<String>,

    /// Human-readable environment name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Environment description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Events pushed by the server over an environment connection.
///
/// Unknown fields are ignored so that the server can extend payloads without
/// breaking older clients. Unknown `type` values fail to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Initial snapshot sent right after the connection opens.
    Welcome {
        /// Greeting text to show in the log.
        message: String,
        /// Environment details. `None` if the server omitted them.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        environment: Option<EnvironmentSnapshot>,
        /// Server timestamp, if provided.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },

    /// A mind entered the environment.
    MindJoined {
        /// Display name of the mind that joined.
        mind_name: String,
        /// Presence after the join.
        present_minds: Vec<String>,
        /// Server timestamp.
        timestamp: String,
    },

    /// A mind left the environment.
    MindLeft {
        /// Display name of the mind that left.
        mind_name: String,
        /// Presence after the departure.
        present_minds: Vec<String>,
        /// Server timestamp.
        timestamp: String,
    },

    /// Chat utterance broadcast to every participant.
    ChatMessage {
        /// Display name of the sender.
        from_mind_name: String,
        /// Message text.
        content: String,
        /// Optional emotion tag.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emotion: Option<String>,
        /// Server timestamp.
        timestamp: String,
    },
}

impl InboundMessage {
    /// Decode a JSON text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the frame is not JSON or matches no variant
    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    /// Encode as a JSON text frame. Used by test servers and fixtures.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Wire name of this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::MindJoined { .. } => "mind_joined",
            Self::MindLeft { .. } => "mind_left",
            Self::ChatMessage { .. } => "chat_message",
        }
    }

    /// Server-reported presence carried by this message, if any.
    pub fn present_minds(&self) -> Option<&[String]> {
        match self {
            Self::Welcome { environment, .. } => {
                environment.as_ref().map(|env| env.present_minds.as_slice())
            },
            Self::MindJoined { present_minds, .. } | Self::MindLeft { present_minds, .. } => {
                Some(present_minds)
            },
            Self::ChatMessage { .. } => None,
        }
    }

    /// Timestamp of the event. `None` for a welcome without one.
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            Self::Welcome { timestamp, .. } => timestamp.as_deref(),
            Self::MindJoined { timestamp, .. }
            | Self::MindLeft { timestamp, .. }
            | Self::ChatMessage { timestamp, .. } => Some(timestamp),
        }
    }
}
