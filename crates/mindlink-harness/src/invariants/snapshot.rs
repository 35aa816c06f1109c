//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use mindlink_app::{App, SessionStatus};
use mindlink_client::ConnectionState;

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more clients for invariant checking.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub sessions: Vec<SessionSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(session: SessionSnapshot) -> Self {
        Self { sessions: vec![session] }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_sessions(sessions: Vec<SessionSnapshot>) -> Self {
        Self { sessions }
    }
}

/// What the driver saw at one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRecord {
    /// Session status at render time.
    pub status: SessionStatus,
    /// Number of log entries.
    pub log_len: usize,
    /// Presence list.
    pub presence: Vec<String>,
    /// Status line.
    pub status_message: Option<String>,
}

impl RenderRecord {
    /// Capture the renderable state of an App.
    pub fn capture(app: &App) -> Self {
        Self {
            status: app.status(),
            log_len: app.log().len(),
            presence: app.presence().to_vec(),
            status_message: app.status_message().map(str::to_string),
        }
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Client identifier.
    pub id: u64,
    /// Session status.
    pub status: SessionStatus,
    /// State of the bridge's connection.
    pub connection: ConnectionState,
    /// Presence list shown to the user.
    pub presence: Vec<String>,
    /// Number of log entries.
    pub log_len: usize,
    /// Every render so far, oldest first.
    pub history: Vec<RenderRecord>,
    /// Transport connections opened and not yet closed.
    pub live_connections: usize,
    /// Roster the server holds for this client's room. `None` unless the
    /// network has settled.
    pub server_presence: Option<Vec<String>>,
}

impl SessionSnapshot {
    /// Snapshot of an App with nothing else known.
    pub fn from_app(id: u64, app: &App) -> Self {
        Self {
            id,
            status: app.status(),
            connection: ConnectionState::Closed,
            presence: app.presence().to_vec(),
            log_len: app.log().len(),
            history: Vec::new(),
            live_connections: 0,
            server_presence: None,
        }
    }

    /// Set the connection state.
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionState) -> Self {
        self.connection = connection;
        self
    }

    /// Set the render history.
    #[must_use]
    pub fn with_history(mut self, history: Vec<RenderRecord>) -> Self {
        self.history = history;
        self
    }

    /// Set the number of live transport connections.
    #[must_use]
    pub fn with_live_connections(mut self, live: usize) -> Self {
        self.live_connections = live;
        self
    }

    /// Set the server's roster for this client's room.
    #[must_use]
    pub fn with_server_presence(mut self, roster: Option<Vec<String>>) -> Self {
        self.server_presence = roster;
        self
    }
}
