//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use mindlink_app::SessionStatus;
use mindlink_client::ConnectionState;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// Presence only comes from server reports.
///
/// Every report that sets presence also appends to the log, and leaving or
/// joining clears both. A non-empty presence next to an empty log means it
/// survived a reset or was made up locally.
pub struct PresenceNeedsServerReport;

impl Invariant for PresenceNeedsServerReport {
    fn name(&self) -> &'static str {
        "presence_needs_server_report"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            if session.log_len == 0 && !session.presence.is_empty() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: presence {:?} with an empty log",
                        session.id, session.presence
                    ),
                });
            }
        }
        Ok(())
    }
}

/// UI status agrees with the bridge's connection.
///
/// Checked between inputs, after every event has been folded into the App.
pub struct StatusMatchesConnection;

impl Invariant for StatusMatchesConnection {
    fn name(&self) -> &'static str {
        "status_matches_connection"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            let expected = match session.status {
                SessionStatus::Idle => ConnectionState::Closed,
                SessionStatus::Connecting => ConnectionState::Connecting,
                SessionStatus::Joined { .. } => ConnectionState::Open,
            };
            if session.connection != expected {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: status {:?} with connection {:?}",
                        session.id, session.status, session.connection
                    ),
                });
            }
        }
        Ok(())
    }
}

/// At most one transport connection is live per client.
pub struct SingleConnection;

impl Invariant for SingleConnection {
    fn name(&self) -> &'static str {
        "single_connection"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            if session.live_connections > 1 {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: {} live connections",
                        session.id, session.live_connections
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The message log never shrinks while a session lasts.
///
/// A shorter log is only allowed when it is empty and the render belongs to
/// a leave (`Idle`) or a fresh join (`Connecting`).
pub struct LogResetsOnlyOnSessionChange;

impl Invariant for LogResetsOnlyOnSessionChange {
    fn name(&self) -> &'static str {
        "log_resets_only_on_session_change"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            for window in session.history.windows(2) {
                let (before, after) = (&window[0], &window[1]);
                if after.log_len >= before.log_len {
                    continue;
                }

                let reset = after.log_len == 0
                    && matches!(after.status, SessionStatus::Idle | SessionStatus::Connecting);
                if !reset {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "client {}: log shrank {} → {} while {:?}",
                            session.id, before.log_len, after.log_len, after.status
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Once the network settles, presence equals the server's roster.
///
/// Only checked for welcomed sessions whose snapshot carries the roster.
pub struct PresenceMatchesServer;

impl Invariant for PresenceMatchesServer {
    fn name(&self) -> &'static str {
        "presence_matches_server"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for session in &state.sessions {
            let SessionStatus::Joined { welcomed: true } = session.status else {
                continue;
            };
            let Some(roster) = &session.server_presence else {
                continue;
            };
            if &session.presence != roster {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: shows {:?}, server has {:?}",
                        session.id, session.presence, roster
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mindlink_app::App;

    use super::*;
    use crate::invariants::{RenderRecord, SessionSnapshot};

    fn session(status: SessionStatus, connection: ConnectionState) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot::from_app(1, &App::new()).with_connection(connection);
        snapshot.status = status;
        snapshot
    }

    fn render(status: SessionStatus, log_len: usize) -> RenderRecord {
        RenderRecord { status, log_len, presence: Vec::new(), status_message: None }
    }

    #[test]
    fn presence_without_log_violates() {
        let mut snapshot = session(SessionStatus::Idle, ConnectionState::Closed);
        snapshot.presence = vec!["Nova".into()];

        let result = PresenceNeedsServerReport.check(&SystemSnapshot::single(snapshot.clone()));
        assert!(result.is_err());

        // Idle after a dropped connection keeps what the server reported.
        snapshot.log_len = 2;
        let result = PresenceNeedsServerReport.check(&SystemSnapshot::single(snapshot));
        assert!(result.is_ok());
    }

    #[test]
    fn joined_requires_open_connection() {
        let joined = SessionStatus::Joined { welcomed: false };

        let ok = session(joined, ConnectionState::Open);
        assert!(StatusMatchesConnection.check(&SystemSnapshot::single(ok)).is_ok());

        let bad = session(joined, ConnectionState::Closed);
        assert!(StatusMatchesConnection.check(&SystemSnapshot::single(bad)).is_err());
    }

    #[test]
    fn two_live_connections_violate() {
        let snapshot =
            session(SessionStatus::Connecting, ConnectionState::Connecting).with_live_connections(2);
        assert!(SingleConnection.check(&SystemSnapshot::single(snapshot)).is_err());
    }

    #[test]
    fn log_may_reset_on_leave_but_not_mid_session() {
        let joined = SessionStatus::Joined { welcomed: true };

        let leave = session(SessionStatus::Idle, ConnectionState::Closed)
            .with_history(vec![render(joined, 3), render(SessionStatus::Idle, 0)]);
        assert!(LogResetsOnlyOnSessionChange.check(&SystemSnapshot::single(leave)).is_ok());

        let shrink = session(joined, ConnectionState::Open)
            .with_history(vec![render(joined, 3), render(joined, 2)]);
        assert!(LogResetsOnlyOnSessionChange.check(&SystemSnapshot::single(shrink)).is_err());
    }

    #[test]
    fn presence_compared_only_when_roster_known() {
        let joined = SessionStatus::Joined { welcomed: true };
        let mut snapshot = session(joined, ConnectionState::Open);
        snapshot.presence = vec!["Nova".into()];
        assert!(PresenceMatchesServer.check(&SystemSnapshot::single(snapshot.clone())).is_ok());

        let snapshot = snapshot.with_server_presence(Some(vec!["Nova".into(), "Atlas".into()]));
        assert!(PresenceMatchesServer.check(&SystemSnapshot::single(snapshot)).is_err());
    }
}
