//! Connection lifecycle state machine.
//!
//! One [`ConnectionManager`] owns one membership's connection. It performs no
//! I/O: socket work is delegated to a [`Transport`], whose outcomes are fed
//! back through [`ConnectionManager::handle_transport_event`].
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐ connect() ┌────────────┐  Opened   ┌──────┐
//! │ Closed │──────────>│ Connecting │──────────>│ Open │
//! └────────┘           └────────────┘           └──────┘
//!      ↑                      │                     │
//!      │   Closed/disconnect  │                     │ disconnect()
//!      │<─────────────────────┘                     ↓
//!      │                                       ┌─────────┐
//!      └───────────────────────────────────────│ Closing │
//!                                              └─────────┘
//! ```
//!
//! # Invariants
//!
//! - At most one transport connection is active per manager.
//! - `on_connect` fires exactly once per cycle that reaches `Open`.
//! - `on_disconnect` fires at most once per cycle.
//! - No callback fires for a cycle after `disconnect()` returns.
//! - Inbound messages reach `on_message` in transport order.

use std::fmt;

use mindlink_proto::{InboundMessage, OutboundMessage};
use serde_json::Value;
use url::Url;

use crate::{
    config::{ClientConfig, DeliveryMode},
    endpoint::{Membership, environment_url},
    error::ClientError,
    transport::{ConnectionId, Transport, TransportError, TransportEvent},
};

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection. Initial and terminal state of every cycle.
    Closed,
    /// Transport asked to open, not yet open.
    Connecting,
    /// Transport open; sends are transmitted.
    Open,
    /// Teardown in progress.
    Closing,
}

type MessageHook = Box<dyn FnMut(InboundMessage) + Send>;
type LifecycleHook = Box<dyn FnMut() + Send>;
type ErrorHook = Box<dyn FnMut(ClientError) + Send>;

/// Optional hooks invoked by the manager.
///
/// All hooks run synchronously inside the manager call that triggered them.
#[derive(Default)]
pub struct ConnectionCallbacks {
    on_message: Option<MessageHook>,
    on_connect: Option<LifecycleHook>,
    on_disconnect: Option<LifecycleHook>,
    on_error: Option<ErrorHook>,
}

impl ConnectionCallbacks {
    /// Callbacks with no hooks installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per decodable inbound frame, in arrival order.
    #[must_use]
    pub fn on_message(mut self, hook: impl FnMut(InboundMessage) + Send + 'static) -> Self {
        self.on_message = Some(Box::new(hook));
        self
    }

    /// Called when the transport opens.
    #[must_use]
    pub fn on_connect(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_connect = Some(Box::new(hook));
        self
    }

    /// Called when the connection closes for any reason.
    #[must_use]
    pub fn on_disconnect(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_disconnect = Some(Box::new(hook));
        self
    }

    /// Called on transport errors (and decode errors in strict mode).
    #[must_use]
    pub fn on_error(mut self, hook: impl FnMut(ClientError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    fn message(&mut self, msg: InboundMessage) {
        if let Some(hook) = self.on_message.as_mut() {
            hook(msg);
        }
    }

    fn connect(&mut self) {
        if let Some(hook) = self.on_connect.as_mut() {
            hook();
        }
    }

    fn disconnect(&mut self) {
        if let Some(hook) = self.on_disconnect.as_mut() {
            hook();
        }
    }

    fn error(&mut self, err: ClientError) {
        if let Some(hook) = self.on_error.as_mut() {
            hook(err);
        }
    }
}

impl fmt::Debug for ConnectionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCallbacks")
            .field("on_message", &self.on_message.is_some())
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Owns the transport connection for one environment membership.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    url: Url,
    state: ConnectionState,
    /// Active cycle. `None` when closed.
    connection: Option<ConnectionId>,
    callbacks: ConnectionCallbacks,
    delivery: DeliveryMode,
}

impl<T: Transport> ConnectionManager<T> {
    /// Create a manager for an explicit socket URL.
    pub fn new(transport: T, url: Url, callbacks: ConnectionCallbacks) -> Self {
        Self {
            transport,
            url,
            state: ConnectionState::Closed,
            connection: None,
            callbacks,
            delivery: DeliveryMode::default(),
        }
    }

    /// Create a manager whose URL is derived from the membership.
    ///
    /// # Errors
    ///
    /// - `ClientError::Config` if the endpoint cannot be derived
    pub fn for_membership(
        transport: T,
        config: &ClientConfig,
        membership: &Membership,
        callbacks: ConnectionCallbacks,
    ) -> Result<Self, ClientError> {
        let url = environment_url(&config.base_url, membership)?;
        Ok(Self::new(transport, url, callbacks).with_delivery(config.delivery))
    }

    /// Set the delivery mode.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether sends are currently transmitted.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Identifier of the active cycle. `None` when closed.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection
    }

    /// Socket URL this manager dials.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Transport used by this manager.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Tear down and give back the transport for reuse.
    pub fn into_transport(mut self) -> T {
        self.disconnect();
        self.transport
    }

    /// Start a new connection cycle.
    ///
    /// Completion is reported through `on_connect`; failure through `on_error`
    /// followed by `on_disconnect`.
    ///
    /// # Errors
    ///
    /// - `ClientError::AlreadyConnected` if the previous cycle is still active
    pub fn connect(&mut self) -> Result<ConnectionId, ClientError> {
        if self.state != ConnectionState::Closed {
            return Err(ClientError::AlreadyConnected { state: self.state });
        }

        let connection = ConnectionId::next();
        self.connection = Some(connection);
        self.state = ConnectionState::Connecting;
        tracing::debug!(%connection, url = %self.url, "connecting");

        if let Err(e) = self.transport.open(connection, &self.url) {
            tracing::warn!(%connection, error = %e, "transport failed to start");
            self.connection = None;
            self.state = ConnectionState::Closed;
            self.callbacks.error(ClientError::Transport(e));
            self.callbacks.disconnect();
        }

        Ok(connection)
    }

    /// Close the connection if one is active.
    ///
    /// No-op when already closed. Fires `on_disconnect` only if the transport
    /// was open.
    pub fn disconnect(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let was_open = self.state == ConnectionState::Open;
        self.state = ConnectionState::Closing;
        self.transport.close(connection);
        self.state = ConnectionState::Closed;
        tracing::debug!(%connection, "disconnected");

        if was_open {
            self.callbacks.disconnect();
        }
    }

    /// Send a chat message.
    ///
    /// # Errors
    ///
    /// - `ClientError::NotConnected` in strict mode when not open
    /// - `ClientError::Transport` in strict mode when the transport rejects
    ///   the frame
    pub fn send_chat(
        &mut self,
        content: impl Into<String>,
        emotion: Option<String>,
    ) -> Result<(), ClientError> {
        self.send("send_chat", &OutboundMessage::chat(content, emotion))
    }

    /// Send a shared object update.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::send_chat`].
    pub fn update_object(
        &mut self,
        object_name: impl Into<String>,
        payload: Value,
    ) -> Result<(), ClientError> {
        self.send("update_object", &OutboundMessage::update_object(object_name, payload))
    }

    fn send(&mut self, operation: &'static str, msg: &OutboundMessage) -> Result<(), ClientError> {
        let connection = match (self.state, self.connection) {
            (ConnectionState::Open, Some(connection)) => connection,
            _ => {
                return match self.delivery {
                    DeliveryMode::Lenient => {
                        tracing::debug!(operation, state = ?self.state, "dropping send while not open");
                        Ok(())
                    },
                    DeliveryMode::Strict => Err(ClientError::NotConnected { operation }),
                };
            },
        };

        let frame = msg.encode()?;
        match self.transport.send_text(connection, frame) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(%connection, operation, error = %e, "send failed");
                match self.delivery {
                    DeliveryMode::Lenient => {
                        self.callbacks.error(ClientError::Transport(e));
                        Ok(())
                    },
                    DeliveryMode::Strict => Err(ClientError::Transport(e)),
                }
            },
        }
    }

    /// Apply an outcome reported by the transport.
    ///
    /// Events for any cycle other than the active one are ignored.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        let connection = event.connection();
        if self.connection != Some(connection) {
            tracing::trace!(%connection, "ignoring event for stale connection");
            return;
        }

        match event {
            TransportEvent::Opened { .. } => {
                if self.state == ConnectionState::Connecting {
                    self.state = ConnectionState::Open;
                    tracing::debug!(%connection, "connection open");
                    self.callbacks.connect();
                } else {
                    tracing::debug!(%connection, state = ?self.state, "duplicate open ignored");
                }
            },
            TransportEvent::Text { frame, .. } => self.handle_frame(connection, &frame),
            TransportEvent::Error { message, .. } => {
                tracing::warn!(%connection, %message, "transport error");
                self.callbacks.error(ClientError::Transport(TransportError::Connection(message)));
            },
            TransportEvent::Closed { reason, .. } => {
                tracing::debug!(%connection, ?reason, "connection closed by transport");
                self.connection = None;
                self.state = ConnectionState::Closed;
                self.transport.close(connection);
                self.callbacks.disconnect();
            },
        }
    }

    fn handle_frame(&mut self, connection: ConnectionId, frame: &str) {
        if self.state != ConnectionState::Open {
            tracing::debug!(%connection, state = ?self.state, "frame before open dropped");
            return;
        }

        match InboundMessage::decode(frame) {
            Ok(msg) => self.callbacks.message(msg),
            Err(e) => match self.delivery {
                DeliveryMode::Lenient => {
                    tracing::debug!(%connection, error = %e, "dropping malformed frame");
                },
                DeliveryMode::Strict => self.callbacks.error(ClientError::Protocol(e)),
            },
        }
    }
}

impl<T: Transport> fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.url.as_str())
            .field("state", &self.state)
            .field("connection", &self.connection)
            .field("delivery", &self.delivery)
            .finish_non_exhaustive()
    }
}
