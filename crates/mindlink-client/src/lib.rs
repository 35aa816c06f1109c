//! Client
//!
//! Connection manager for a single environment membership. Owns one transport
//! connection to a room-scoped endpoint, exposes a typed send API, and reports
//! lifecycle and inbound messages through callbacks.
//!
//! # Architecture
//!
//! The manager does no I/O itself. A [`Transport`] performs the socket work and
//! feeds [`TransportEvent`]s back through
//! [`ConnectionManager::handle_transport_event`]. Every `connect()` cycle is
//! tagged with a fresh [`ConnectionId`] so events from a torn-down socket can
//! never reach the callbacks of a newer one.
//!
//! # Components
//!
//! - [`ConnectionManager`]: lifecycle state machine and send surface
//! - [`ConnectionCallbacks`]: optional `on_message`/`on_connect`/
//!   `on_disconnect`/`on_error` hooks
//! - [`Membership`] and [`environment_url`]: endpoint derivation
//! - [`ClientConfig`]: base URL and delivery mode
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, [`ws::WsTransport`] provides a
//! WebSocket implementation on top of tokio-tungstenite.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod connection;
mod endpoint;
mod error;
mod transport;

#[cfg(feature = "transport")]
pub mod ws;

pub use config::{ClientConfig, DEFAULT_SERVER_URL, DeliveryMode};
pub use connection::{ConnectionCallbacks, ConnectionManager, ConnectionState};
pub use endpoint::{Membership, environment_url};
pub use error::{ClientError, ConfigError};
pub use mindlink_proto::{EnvironmentSnapshot, InboundMessage, OutboundMessage};
pub use transport::{ConnectionId, Transport, TransportError, TransportEvent};
