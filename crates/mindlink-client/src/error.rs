//! Error types for the connection manager.

use mindlink_proto::ProtocolError;
use thiserror::Error;

use crate::{connection::ConnectionState, transport::TransportError};

/// Errors reported by [`crate::ConnectionManager`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// `connect()` called while a connection cycle is still active.
    #[error("already connected: cannot connect from {state:?}")]
    AlreadyConnected {
        /// State when the call was made.
        state: ConnectionState,
    },

    /// Send attempted without an open connection (strict mode only).
    #[error("not connected: cannot {operation}")]
    NotConnected {
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// Frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Underlying transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid endpoint or membership configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors in client configuration or membership input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL failed to parse.
    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    /// Base URL uses a scheme that cannot carry a WebSocket.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// A required membership field was blank.
    #[error("missing {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_message_keeps_cause() {
        let err = ClientError::Transport(TransportError::Connection("refused".into()));
        assert_eq!(err.to_string(), "transport error: connection failed: refused");

        let err = ClientError::AlreadyConnected { state: ConnectionState::Open };
        assert_eq!(err.to_string(), "already connected: cannot connect from Open");
    }

    #[test]
    fn missing_field_message_names_field() {
        assert_eq!(ConfigError::MissingField("mind name").to_string(), "missing mind name");
    }
}
