//! Transport backed by a [`SimNetwork`].
//!
//! Records every call so tests can assert on what the client put on the wire.

use std::collections::BTreeSet;

use mindlink_client::{ConnectionId, Transport, TransportError};
use url::Url;

use crate::sim_network::SimNetwork;

/// In-memory [`Transport`] for one simulated client.
#[derive(Debug, Clone)]
pub struct SimTransport {
    network: SimNetwork,
    endpoint: u64,
    live: BTreeSet<ConnectionId>,
    opened: Vec<Url>,
    sent: Vec<String>,
    closed: Vec<ConnectionId>,
    refuse_opens: bool,
}

impl SimTransport {
    pub(crate) fn new(network: SimNetwork, endpoint: u64) -> Self {
        Self {
            network,
            endpoint,
            live: BTreeSet::new(),
            opened: Vec::new(),
            sent: Vec::new(),
            closed: Vec::new(),
            refuse_opens: false,
        }
    }

    /// Make `open` fail synchronously, as when no runtime is available.
    #[must_use]
    pub fn refusing_opens(mut self) -> Self {
        self.refuse_opens = true;
        self
    }

    /// Network endpoint this transport receives events on.
    pub fn endpoint(&self) -> u64 {
        self.endpoint
    }

    /// Network this transport is attached to.
    pub fn network(&self) -> &SimNetwork {
        &self.network
    }

    /// Connections opened and not yet closed.
    pub fn active_connections(&self) -> usize {
        self.live.len()
    }

    /// Most recently opened connection that is still live.
    pub fn latest_connection(&self) -> Option<ConnectionId> {
        self.live.last().copied()
    }

    /// URLs opened, oldest first.
    pub fn opened(&self) -> &[Url] {
        &self.opened
    }

    /// Frames sent, oldest first.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Connections closed by the client, oldest first.
    pub fn closed(&self) -> &[ConnectionId] {
        &self.closed
    }
}

impl Transport for SimTransport {
    fn open(&mut self, connection: ConnectionId, url: &Url) -> Result<(), TransportError> {
        if self.refuse_opens {
            return Err(TransportError::Connection("simulated open failure".into()));
        }
        self.opened.push(url.clone());
        self.live.insert(connection);
        self.network.open(self.endpoint, connection, url);
        Ok(())
    }

    fn send_text(&mut self, connection: ConnectionId, frame: String) -> Result<(), TransportError> {
        if !self.live.contains(&connection) {
            return Err(TransportError::Send(format!("{connection} is not open")));
        }
        self.network.send(connection, &frame);
        self.sent.push(frame);
        Ok(())
    }

    fn close(&mut self, connection: ConnectionId) {
        if self.live.remove(&connection) {
            self.closed.push(connection);
        }
        self.network.close(connection);
    }
}
