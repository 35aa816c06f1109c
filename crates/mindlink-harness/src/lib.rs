//! Deterministic simulation harness for Mindlink clients.
//!
//! In-memory implementations of the transport, clock and driver seams so the
//! production [`mindlink_app::Runtime`] can be driven against a simulated
//! environment server with fully reproducible ordering.
//!
//! # Components
//!
//! - [`SimNetwork`]: shared in-memory network with a [`SimServer`] behind it
//! - [`SimTransport`]: [`mindlink_client::Transport`] backed by a `SimNetwork`
//! - [`SimDriver`]: [`mindlink_app::Driver`] with scripted commands
//! - [`SimClient`]: a runtime wired to all of the above
//! - [`SimClock`]: deterministic timestamps
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! App/Bridge invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_client;
pub mod sim_clock;
pub mod sim_driver;
pub mod sim_network;
pub mod sim_server;
pub mod sim_transport;

pub use invariants::{
    Invariant, InvariantRegistry, InvariantResult, LogResetsOnlyOnSessionChange,
    PresenceMatchesServer, PresenceNeedsServerReport, RenderRecord, SessionSnapshot,
    SingleConnection, StatusMatchesConnection, SystemSnapshot, Violation,
};
pub use sim_client::{SimClient, settle};
pub use sim_clock::SimClock;
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_network::{NetworkMode, SimNetwork};
pub use sim_server::{ObjectUpdate, SimServer};
pub use sim_transport::SimTransport;
