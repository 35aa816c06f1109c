//! Client-to-server requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ProtocolError, Result};

/// Requests a client sends over an environment connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Say something in the environment.
    Chat {
        /// Message text.
        content: String,
        /// Optional emotion tag. Omitted from the frame when `None`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emotion: Option<String>,
    },

    /// Update a named shared object (e.g. a whiteboard).
    UpdateObject {
        /// Name of the shared object.
        object_name: String,
        /// Arbitrary JSON payload.
        payload: Value,
    },
}

impl OutboundMessage {
    /// Create a chat message.
    pub fn chat(content: impl Into<String>, emotion: Option<String>) -> Self {
        Self::Chat { content: content.into(), emotion }
    }

    /// Create a shared object update.
    pub fn update_object(object_name: impl Into<String>, payload: Value) -> Self {
        Self::UpdateObject { object_name: object_name.into(), payload }
    }

    /// Encode as a JSON text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decode a JSON text frame. Used by test servers.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the frame matches no variant
    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}
