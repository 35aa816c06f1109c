//! Simulated client.
//!
//! A [`SimClient`] is the production [`Runtime`] wired to a [`SimDriver`] and
//! a [`SimTransport`]. Tests issue commands and pump network events one input
//! at a time; the standard invariants are checked after every step.

use std::sync::Arc;

use mindlink_app::{App, Bridge, Command, Input, Runtime};
use mindlink_client::{ClientConfig, ConnectionState};

use crate::{
    invariants::{InvariantRegistry, RenderRecord, SessionSnapshot, SystemSnapshot},
    sim_clock::SimClock,
    sim_driver::{SimDriver, SimDriverError},
    sim_network::{NetworkMode, SimNetwork},
    sim_transport::SimTransport,
};

/// One client attached to a [`SimNetwork`].
pub struct SimClient {
    id: u64,
    network: SimNetwork,
    runtime: Runtime<SimDriver, SimTransport>,
    invariants: InvariantRegistry,
}

impl SimClient {
    /// Create an idle client with a deterministic clock.
    pub fn new(id: u64, network: &SimNetwork, config: ClientConfig) -> Self {
        Self::with_transport(id, network.transport(), config)
    }

    /// Create an idle client over a prepared transport.
    pub fn with_transport(id: u64, transport: SimTransport, config: ClientConfig) -> Self {
        let network = transport.network().clone();
        let driver = SimDriver::new(network.clone(), transport.endpoint());
        let app = App::new().with_clock(Arc::new(SimClock::new()));
        let runtime = Runtime::new(driver, app, Bridge::new(transport, config));
        Self { id, network, runtime, invariants: InvariantRegistry::standard() }
    }

    /// Replace the App, keeping the driver and bridge.
    #[must_use]
    pub fn with_app(mut self, app: App) -> Self {
        *self.runtime.app_mut() = app;
        self
    }

    /// Run one user command to completion.
    ///
    /// Returns `true` if the App asked to quit.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or an invariant is violated.
    pub fn command(&mut self, command: Command) -> Result<bool, SimDriverError> {
        self.step(Input::Command(command))
    }

    /// Deliver every pending network event for this client.
    ///
    /// Returns the number of events delivered.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or an invariant is violated.
    pub fn pump(&mut self) -> Result<usize, SimDriverError> {
        let mut delivered = 0;
        while let Some(input) = self.runtime.driver_mut().poll_transport() {
            self.step(input)?;
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Process one input and check invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or an invariant is violated.
    pub fn step(&mut self, input: Input) -> Result<bool, SimDriverError> {
        let quit = self.runtime.step(input)?;
        self.check_invariants()?;
        Ok(quit)
    }

    /// Check the configured invariants against this client alone.
    ///
    /// # Errors
    ///
    /// Returns every violation found, joined into one error.
    pub fn check_invariants(&self) -> Result<(), SimDriverError> {
        check(&self.invariants, &SystemSnapshot::single(self.snapshot()))
    }

    /// Observable state of this client.
    ///
    /// The server roster is included only once the network has settled.
    pub fn snapshot(&self) -> SessionSnapshot {
        let app = self.runtime.app();
        let bridge = self.runtime.bridge();

        let server_presence = (self.network.mode() != NetworkMode::Manual
            && self.network.is_settled())
        .then(|| app.membership().map(|m| self.network.presence(m.room_id())))
        .flatten();

        SessionSnapshot::from_app(self.id, app)
            .with_connection(bridge.connection_state())
            .with_history(self.renders().to_vec())
            .with_live_connections(bridge.transport().map_or(0, SimTransport::active_connections))
            .with_server_presence(server_presence)
    }

    /// Client identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The App.
    pub fn app(&self) -> &App {
        self.runtime.app()
    }

    /// The transport, with its record of opens, sends and closes.
    pub fn transport(&self) -> Option<&SimTransport> {
        self.runtime.bridge().transport()
    }

    /// State of the bridge's connection.
    pub fn connection_state(&self) -> ConnectionState {
        self.runtime.bridge().connection_state()
    }

    /// Every render so far, oldest first.
    pub fn renders(&self) -> &[RenderRecord] {
        self.runtime.driver().renders()
    }
}

/// Pump every client until no network events remain, then check the
/// invariants across all of them together.
///
/// Returns the number of events delivered.
///
/// # Errors
///
/// Returns an error if any step fails or an invariant is violated.
pub fn settle(clients: &mut [SimClient]) -> Result<usize, SimDriverError> {
    let mut total = 0;
    loop {
        let mut delivered = 0;
        for client in clients.iter_mut() {
            delivered += client.pump()?;
        }
        if delivered == 0 {
            break;
        }
        total += delivered;
    }

    let snapshot = SystemSnapshot::from_sessions(clients.iter().map(SimClient::snapshot).collect());
    check(&InvariantRegistry::standard(), &snapshot)?;
    Ok(total)
}

fn check(registry: &InvariantRegistry, snapshot: &SystemSnapshot) -> Result<(), SimDriverError> {
    registry.check_all(snapshot).map_err(|violations| {
        let messages: Vec<String> = violations.iter().map(ToString::to_string).collect();
        SimDriverError(messages.join("; "))
    })
}
