//! Application state machine.
//!
//! This module defines the [`App`] state machine, which folds the server's
//! event stream into what a frontend renders: an append-only message log, the
//! current presence list and the session status.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! user operations and produces [`crate::AppAction`] instructions for the
//! runtime to execute.
//!
//! # Invariants
//!
//! - Presence is always the last list the server reported.
//! - The log only grows while a session lasts. Log and presence are cleared
//!   when leaving and when a new join starts, and kept when the connection
//!   drops.
//! - Server messages received while idle are ignored.

use std::{collections::VecDeque, sync::Arc};

use mindlink_client::{ConfigError, Membership};
use mindlink_proto::InboundMessage;
use serde_json::Value;
use thiserror::Error;

use crate::{
    AppAction, AppEvent, ChatOrigin, Clock, Command, EchoPolicy, LogEntry, SessionStatus,
    SystemClock,
};

/// Errors returned synchronously by App operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Join input failed validation.
    #[error("cannot join: {0}")]
    Validation(#[from] ConfigError),
}

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Session status.
    status: SessionStatus,
    /// Current membership. `None` when idle.
    membership: Option<Membership>,
    /// Ordered message log.
    log: Vec<LogEntry>,
    /// Display names of present minds, in server order.
    presence: Vec<String>,
    /// Own-broadcast handling.
    echo_policy: EchoPolicy,
    /// Contents of local sends awaiting their broadcast, oldest first.
    pending_echoes: VecDeque<String>,
    /// Timestamp source for local entries.
    clock: Arc<dyn Clock>,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create an idle App using the system clock.
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            membership: None,
            log: Vec::new(),
            presence: Vec::new(),
            echo_policy: EchoPolicy::default(),
            pending_echoes: VecDeque::new(),
            clock: Arc::new(SystemClock),
            status_message: None,
        }
    }

    /// Use a different timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the own-broadcast policy.
    #[must_use]
    pub fn with_echo_policy(mut self, policy: EchoPolicy) -> Self {
        self.echo_policy = policy;
        self
    }

    /// Join an environment.
    ///
    /// Tears down the current session first if there is one. The log and
    /// presence start empty.
    ///
    /// # Errors
    ///
    /// - `AppError::Validation` if any field is blank. State is unchanged.
    pub fn join(
        &mut self,
        room_id: &str,
        gmid: &str,
        mind_name: &str,
    ) -> Result<Vec<AppAction>, AppError> {
        let membership = Membership::new(room_id, gmid, mind_name)?;

        let mut actions = Vec::new();
        if self.status != SessionStatus::Idle {
            actions.push(AppAction::Disconnect);
        }

        self.reset_session();
        self.status = SessionStatus::Connecting;
        self.status_message = Some(format!(
            "Joining {} as {}...",
            membership.room_id(),
            membership.mind_name()
        ));
        self.membership = Some(membership.clone());

        actions.push(AppAction::Connect { membership });
        actions.push(AppAction::Render);
        Ok(actions)
    }

    /// Leave the environment. Safe to call when idle.
    pub fn leave(&mut self) -> Vec<AppAction> {
        if let Some(membership) = &self.membership {
            self.status_message = Some(format!("Left {}", membership.room_id()));
        }
        self.reset_session();
        self.membership = None;
        self.status = SessionStatus::Idle;
        vec![AppAction::Disconnect, AppAction::Render]
    }

    /// Send a chat message.
    ///
    /// The message is appended to the log immediately, before the server
    /// broadcasts it back.
    pub fn send_chat(&mut self, content: &str, emotion: Option<String>) -> Vec<AppAction> {
        if !self.status.is_joined() {
            self.status_message = Some("Not in an environment".into());
            return vec![AppAction::Render];
        }
        if content.trim().is_empty() {
            return vec![];
        }
        let Some(membership) = &self.membership else {
            return vec![];
        };

        self.log.push(LogEntry::Chat {
            sender: membership.mind_name().to_string(),
            content: content.to_string(),
            emotion: emotion.clone(),
            timestamp: self.clock.now_timestamp(),
            origin: ChatOrigin::Local,
        });
        if self.echo_policy == EchoPolicy::SuppressOwnEcho {
            self.pending_echoes.push_back(content.to_string());
        }

        vec![AppAction::SendChat { content: content.to_string(), emotion }, AppAction::Render]
    }

    /// Update a shared environment object.
    pub fn update_object(&mut self, object_name: &str, payload: Value) -> Vec<AppAction> {
        if !self.status.is_joined() {
            self.status_message = Some("Not in an environment".into());
            return vec![AppAction::Render];
        }

        self.status_message = Some(format!("Updated {object_name}"));
        vec![AppAction::UpdateObject { object_name: object_name.to_string(), payload }, AppAction::Render]
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Execute a parsed user command.
    pub fn execute(&mut self, command: Command) -> Vec<AppAction> {
        match command {
            Command::Join { room_id, gmid, mind_name } => {
                match self.join(&room_id, &gmid, &mind_name) {
                    Ok(actions) => actions,
                    Err(e) => {
                        self.status_message = Some(e.to_string());
                        vec![AppAction::Render]
                    },
                }
            },
            Command::Leave => self.leave(),
            Command::Chat { content, emotion } => self.send_chat(&content, emotion),
            Command::UpdateObject { object_name, payload } => {
                self.update_object(&object_name, payload)
            },
            Command::Quit => self.quit(),
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Connecting => {
                if self.membership.is_none() {
                    return vec![];
                }
                self.status = SessionStatus::Connecting;
                vec![AppAction::Render]
            },
            AppEvent::Connected => {
                if self.status != SessionStatus::Connecting {
                    tracing::debug!(status = ?self.status, "connected event outside a join");
                    return vec![];
                }
                self.status = SessionStatus::Joined { welcomed: false };
                self.status_message = Some("Connected".into());
                vec![AppAction::Render]
            },
            AppEvent::Disconnected => {
                if self.status == SessionStatus::Idle {
                    return vec![];
                }
                // Log and presence stay as the server last reported them.
                self.status = SessionStatus::Idle;
                self.membership = None;
                self.pending_echoes.clear();
                self.status_message = Some("Disconnected from environment".into());
                vec![AppAction::Render]
            },
            AppEvent::MessageReceived(msg) => self.apply_message(msg),
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    fn apply_message(&mut self, msg: InboundMessage) -> Vec<AppAction> {
        if self.status == SessionStatus::Idle {
            tracing::debug!(kind = msg.kind(), "ignoring message while idle");
            return vec![];
        }

        match msg {
            InboundMessage::Welcome { message, environment, timestamp } => {
                self.log.push(LogEntry::system(message, timestamp));
                if let Some(environment) = environment {
                    self.presence = environment.present_minds;
                }
                if let SessionStatus::Joined { welcomed } = &mut self.status {
                    *welcomed = true;
                }
            },
            InboundMessage::MindJoined { mind_name, present_minds, timestamp } => {
                self.log.push(LogEntry::system(
                    format!("{mind_name} joined the environment"),
                    Some(timestamp),
                ));
                self.presence = present_minds;
            },
            InboundMessage::MindLeft { mind_name, present_minds, timestamp } => {
                self.log.push(LogEntry::system(
                    format!("{mind_name} left the environment"),
                    Some(timestamp),
                ));
                self.presence = present_minds;
            },
            InboundMessage::ChatMessage { from_mind_name, content, emotion, timestamp } => {
                if self.is_own_echo(&from_mind_name, &content) {
                    self.pending_echoes.pop_front();
                    return vec![];
                }
                self.log.push(LogEntry::Chat {
                    sender: from_mind_name,
                    content,
                    emotion,
                    timestamp,
                    origin: ChatOrigin::Remote,
                });
            },
        }

        vec![AppAction::Render]
    }

    fn is_own_echo(&self, sender: &str, content: &str) -> bool {
        self.echo_policy == EchoPolicy::SuppressOwnEcho
            && self.membership.as_ref().is_some_and(|m| m.mind_name() == sender)
            && self.pending_echoes.front().is_some_and(|pending| pending == content)
    }

    fn reset_session(&mut self) {
        self.log.clear();
        self.presence.clear();
        self.pending_echoes.clear();
    }

    /// Current session status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Current membership. `None` when idle.
    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    /// Message log in arrival order.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Present minds as last reported by the server.
    pub fn presence(&self) -> &[String] {
        &self.presence
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
