//! Observable application state types.
//!
//! These are the "view model" of an environment session: what a frontend needs
//! to render the log, the presence list and the connection status, without any
//! of the connection mechanics behind them.

/// Session status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Not in an environment.
    #[default]
    Idle,
    /// Join requested, connection not yet open.
    Connecting,
    /// Connection open.
    Joined {
        /// The server's `welcome` has been received.
        welcomed: bool,
    },
}

impl SessionStatus {
    /// True when chat can be sent.
    pub fn is_joined(self) -> bool {
        matches!(self, Self::Joined { .. })
    }
}

/// Where a chat entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOrigin {
    /// Appended optimistically when the local user sent it.
    Local,
    /// Broadcast by the server.
    Remote,
}

/// Handling of the server's broadcast of our own chat.
///
/// The server sends every chat back to all participants, sender included.
/// Since sends are echoed into the log immediately, `Keep` shows own messages
/// twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoPolicy {
    /// Append every broadcast.
    #[default]
    Keep,
    /// Drop a broadcast from ourselves whose content matches the oldest
    /// unconfirmed local send.
    SuppressOwnEcho,
}

/// One line in the environment log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// Display-only notice (welcome text, joins, departures).
    System {
        /// Notice text.
        text: String,
        /// Server timestamp. `None` if the server gave none.
        timestamp: Option<String>,
    },

    /// Chat message.
    Chat {
        /// Display name of the sender.
        sender: String,
        /// Message text.
        content: String,
        /// Optional emotion tag.
        emotion: Option<String>,
        /// Server timestamp, or local clock for [`ChatOrigin::Local`].
        timestamp: String,
        /// Local echo or server broadcast.
        origin: ChatOrigin,
    },
}

impl LogEntry {
    /// System notice, stamped with the server time when one was given.
    pub fn system(text: impl Into<String>, timestamp: Option<String>) -> Self {
        Self::System { text: text.into(), timestamp }
    }

    /// Timestamp of the entry, if any.
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            Self::System { timestamp, .. } => timestamp.as_deref(),
            Self::Chat { timestamp, .. } => Some(timestamp),
        }
    }

    /// True for chat entries.
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::Chat { .. })
    }
}
