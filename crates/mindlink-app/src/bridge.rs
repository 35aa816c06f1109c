//! Connection-to-Application translation layer.
//!
//! The [`Bridge`] owns the single [`ConnectionManager`] of a session and adapts
//! it to the application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts [`crate::AppAction`]s into connection manager calls.
//! - Collects manager callbacks as [`crate::AppEvent`]s for the App.
//! - Keeps at most one connection alive: connecting for a new membership tears
//!   down the previous manager first and reuses its transport.
//!
//! Callbacks are tagged with the session that installed them. Events from a
//! session the bridge has already torn down are dropped, so a deliberate
//! disconnect can never be mistaken for the new session ending.

use mindlink_client::{
    ClientConfig, ClientError, ConnectionCallbacks, ConnectionManager, ConnectionState,
    DeliveryMode, Membership, Transport, TransportEvent,
};
use tokio::sync::mpsc;

use crate::{AppAction, AppEvent};

type Tagged = (u64, AppEvent);

/// Bridge between App and the connection manager.
///
/// Generic over [`Transport`] so production and simulation share the same
/// orchestration.
pub struct Bridge<T: Transport> {
    config: ClientConfig,
    /// Active manager. Owns the transport while present.
    manager: Option<ConnectionManager<T>>,
    /// Transport parked while no manager exists.
    idle: Option<T>,
    /// Session whose callbacks are currently accepted.
    session: u64,
    events_tx: mpsc::UnboundedSender<Tagged>,
    events_rx: mpsc::UnboundedReceiver<Tagged>,
}

impl<T: Transport> Bridge<T> {
    /// Create a bridge with no active connection.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self { config, manager: None, idle: Some(transport), session: 0, events_tx, events_rx }
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        match action {
            AppAction::Connect { membership } => self.connect(&membership),
            AppAction::Disconnect => {
                self.teardown();
                Vec::new()
            },
            AppAction::SendChat { content, emotion } => {
                let result = match self.manager.as_mut() {
                    Some(manager) => manager.send_chat(content, emotion),
                    None => self.not_connected("send_chat"),
                };
                self.handle_result(result)
            },
            AppAction::UpdateObject { object_name, payload } => {
                let result = match self.manager.as_mut() {
                    Some(manager) => manager.update_object(object_name, payload),
                    None => self.not_connected("update_object"),
                };
                self.handle_result(result)
            },
            AppAction::Render | AppAction::Quit => Vec::new(),
        }
    }

    /// Feed a transport event to the active manager.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> Vec<AppEvent> {
        match self.manager.as_mut() {
            Some(manager) => manager.handle_transport_event(event),
            None => tracing::trace!(connection = %event.connection(), "no active connection"),
        }
        self.take_events()
    }

    /// Drain events produced by the current session's callbacks.
    pub fn take_events(&mut self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok((session, event)) = self.events_rx.try_recv() {
            if session == self.session {
                events.push(event);
            } else {
                tracing::trace!(session, ?event, "dropping event from ended session");
            }
        }
        events
    }

    /// Close the active connection, if any.
    pub fn shutdown(&mut self) {
        self.teardown();
    }

    /// State of the active connection. `Closed` when there is none.
    pub fn connection_state(&self) -> ConnectionState {
        self.manager.as_ref().map_or(ConnectionState::Closed, ConnectionManager::state)
    }

    /// Transport in use, whether active or parked.
    pub fn transport(&self) -> Option<&T> {
        match &self.manager {
            Some(manager) => Some(manager.transport()),
            None => self.idle.as_ref(),
        }
    }

    fn connect(&mut self, membership: &Membership) -> Vec<AppEvent> {
        self.teardown();

        let Some(transport) = self.idle.take() else {
            return vec![
                AppEvent::Error { message: "transport unavailable".into() },
                AppEvent::Disconnected,
            ];
        };

        // The endpoint only fails to derive from a bad base URL, which every
        // later membership would hit too, so the transport is not kept.
        let callbacks = self.callbacks(self.session);
        let mut manager =
            match ConnectionManager::for_membership(transport, &self.config, membership, callbacks)
            {
                Ok(manager) => manager,
                Err(e) => {
                    tracing::warn!(error = %e, "cannot derive environment endpoint");
                    return vec![AppEvent::Error { message: e.to_string() }, AppEvent::Disconnected];
                },
            };

        tracing::info!(
            room = membership.room_id(),
            mind = membership.mind_name(),
            url = %manager.url(),
            "joining environment"
        );
        self.forward(AppEvent::Connecting);
        if let Err(e) = manager.connect() {
            self.forward(AppEvent::Error { message: e.to_string() });
        }
        self.manager = Some(manager);

        self.take_events()
    }

    /// Drop the manager and park its transport. Ends the current session.
    fn teardown(&mut self) {
        if let Some(manager) = self.manager.take() {
            self.idle = Some(manager.into_transport());
        }
        self.session += 1;
    }

    fn callbacks(&self, session: u64) -> ConnectionCallbacks {
        let (on_message, on_connect, on_disconnect, on_error) = (
            self.events_tx.clone(),
            self.events_tx.clone(),
            self.events_tx.clone(),
            self.events_tx.clone(),
        );

        ConnectionCallbacks::new()
            .on_message(move |msg| send(&on_message, session, AppEvent::MessageReceived(msg)))
            .on_connect(move || send(&on_connect, session, AppEvent::Connected))
            .on_disconnect(move || send(&on_disconnect, session, AppEvent::Disconnected))
            .on_error(move |e| send(&on_error, session, AppEvent::Error { message: e.to_string() }))
    }

    fn forward(&self, event: AppEvent) {
        send(&self.events_tx, self.session, event);
    }

    fn not_connected(&self, operation: &'static str) -> Result<(), ClientError> {
        match self.config.delivery {
            DeliveryMode::Lenient => {
                tracing::debug!(operation, "dropping send without a connection");
                Ok(())
            },
            DeliveryMode::Strict => Err(ClientError::NotConnected { operation }),
        }
    }

    fn handle_result(&mut self, result: Result<(), ClientError>) -> Vec<AppEvent> {
        let mut events = self.take_events();
        if let Err(e) = result {
            events.push(AppEvent::Error { message: e.to_string() });
        }
        events
    }
}

fn send(tx: &mpsc::UnboundedSender<Tagged>, session: u64, event: AppEvent) {
    if tx.send((session, event)).is_err() {
        tracing::trace!("bridge event channel closed");
    }
}
