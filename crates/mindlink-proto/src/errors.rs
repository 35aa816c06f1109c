//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while translating between frames and typed messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is not valid JSON or does not match any known message shape.
    #[error("failed to decode frame: {0}")]
    Decode(String),

    /// Message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(String),
}
