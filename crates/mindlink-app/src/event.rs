//! Application input events.
//!
//! [`AppEvent`]s drive the [`crate::App`] state machine. They are produced by
//! the [`crate::Bridge`] from connection manager callbacks.

use mindlink_proto::InboundMessage;

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Connection attempt started.
    Connecting,

    /// Connection open.
    Connected,

    /// Connection closed.
    Disconnected,

    /// Server pushed a message.
    MessageReceived(InboundMessage),

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}
