//! Transport abstraction.
//!
//! A [`Transport`] performs socket I/O on behalf of the
//! [`crate::ConnectionManager`]. Operations only start work; outcomes come back
//! later as [`TransportEvent`]s tagged with the [`ConnectionId`] they belong
//! to.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use thiserror::Error;
use url::Url;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one `connect()` cycle.
///
/// Unique within the process, so events from a torn-down connection can be
/// told apart even when a transport is reused for a later membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate a fresh identifier.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Transport errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established or was lost.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Frame could not be handed to the socket.
    #[error("send failed: {0}")]
    Send(String),
}

/// Outcome reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Socket is open.
    Opened {
        /// Connection cycle.
        connection: ConnectionId,
    },

    /// Text frame received.
    Text {
        /// Connection cycle.
        connection: ConnectionId,
        /// Raw frame contents.
        frame: String,
    },

    /// Transport-level error. Does not close the connection by itself.
    Error {
        /// Connection cycle.
        connection: ConnectionId,
        /// Error description.
        message: String,
    },

    /// Socket closed (remote close, network failure, or failed connect).
    Closed {
        /// Connection cycle.
        connection: ConnectionId,
        /// Close reason. `None` if the peer gave none.
        reason: Option<String>,
    },
}

impl TransportEvent {
    /// Connection cycle this event belongs to.
    pub fn connection(&self) -> ConnectionId {
        match self {
            Self::Opened { connection }
            | Self::Text { connection, .. }
            | Self::Error { connection, .. }
            | Self::Closed { connection, .. } => *connection,
        }
    }
}

/// Socket I/O used by the connection manager.
///
/// Implementations must not block. Results of `open` are reported through
/// [`TransportEvent`]s; an `Err` return means the attempt never started.
pub trait Transport {
    /// Begin connecting to `url` for the given cycle.
    fn open(&mut self, connection: ConnectionId, url: &Url) -> Result<(), TransportError>;

    /// Queue a text frame on an open connection.
    fn send_text(&mut self, connection: ConnectionId, frame: String)
    -> Result<(), TransportError>;

    /// Close the connection. Must be safe to call for unknown or closed ids.
    fn close(&mut self, connection: ConnectionId);
}
