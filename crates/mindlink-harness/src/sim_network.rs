//! Shared in-memory network.
//!
//! A [`SimNetwork`] connects any number of [`SimTransport`]s to one
//! [`SimServer`]. Transport calls are applied to the server immediately and
//! the resulting events are queued per endpoint, to be delivered later by the
//! endpoint's driver. Nothing is delivered reentrantly, mirroring how a real
//! socket reports outcomes asynchronously.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use mindlink_client::{ConnectionId, TransportEvent};
use url::Url;

use crate::{
    sim_server::{Delivery, ObjectUpdate, SimServer},
    sim_transport::SimTransport,
};

/// How the network treats new connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkMode {
    /// Connections reach the server.
    #[default]
    Online,
    /// Connections fail with an error followed by a close.
    Unreachable,
    /// Nothing is delivered automatically; tests inject every event.
    Manual,
}

#[derive(Debug, Default)]
struct NetworkState {
    server: SimServer,
    mode: NetworkMode,
    next_endpoint: u64,
    /// Endpoint that opened each connection.
    owners: HashMap<ConnectionId, u64>,
    /// Undelivered events per endpoint, in delivery order.
    queues: HashMap<u64, VecDeque<TransportEvent>>,
}

impl NetworkState {
    fn route(&mut self, deliveries: Vec<Delivery>) {
        for (connection, event) in deliveries {
            match self.owners.get(&connection) {
                Some(endpoint) => self.queues.entry(*endpoint).or_default().push_back(event),
                None => tracing::trace!(%connection, "no endpoint for delivery"),
            }
        }
    }
}

/// In-memory network shared by simulated clients.
#[derive(Debug, Clone, Default)]
pub struct SimNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl SimNetwork {
    /// Create an online network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a network in the given mode.
    pub fn with_mode(mode: NetworkMode) -> Self {
        let network = Self::new();
        network.set_mode(mode);
        network
    }

    /// Change how subsequent connections are treated.
    pub fn set_mode(&self, mode: NetworkMode) {
        self.lock().mode = mode;
    }

    /// Current mode.
    pub fn mode(&self) -> NetworkMode {
        self.lock().mode
    }

    /// Create a transport attached to a fresh endpoint.
    pub fn transport(&self) -> SimTransport {
        let endpoint = {
            let mut state = self.lock();
            state.next_endpoint += 1;
            state.next_endpoint
        };
        SimTransport::new(self.clone(), endpoint)
    }

    /// Pop the next undelivered event for an endpoint.
    pub fn pop_event(&self, endpoint: u64) -> Option<TransportEvent> {
        self.lock().queues.get_mut(&endpoint).and_then(VecDeque::pop_front)
    }

    /// Number of undelivered events for an endpoint.
    pub fn pending(&self, endpoint: u64) -> usize {
        self.lock().queues.get(&endpoint).map_or(0, VecDeque::len)
    }

    /// True when no endpoint has undelivered events.
    pub fn is_settled(&self) -> bool {
        self.lock().queues.values().all(VecDeque::is_empty)
    }

    /// Queue an event for the endpoint owning `event`'s connection.
    pub fn inject(&self, event: TransportEvent) {
        let connection = event.connection();
        self.lock().route(vec![(connection, event)]);
    }

    /// Drop a connection from the server side.
    ///
    /// The owner sees a close with `reason`; the rest of the room sees the
    /// mind leave.
    pub fn drop_connection(&self, connection: ConnectionId, reason: Option<String>) {
        let mut state = self.lock();
        let mut deliveries = state.server.leave(connection);
        deliveries.push((connection, TransportEvent::Closed { connection, reason }));
        state.route(deliveries);
    }

    /// Server roster for a room.
    pub fn presence(&self, room_id: &str) -> Vec<String> {
        self.lock().server.presence(room_id)
    }

    /// Room a connection belongs to on the server.
    pub fn room_of(&self, connection: ConnectionId) -> Option<String> {
        self.lock().server.room_of(connection).map(str::to_string)
    }

    /// Object updates the server received.
    pub fn object_updates(&self) -> Vec<ObjectUpdate> {
        self.lock().server.object_updates().to_vec()
    }

    pub(crate) fn open(&self, endpoint: u64, connection: ConnectionId, url: &Url) {
        let mut state = self.lock();
        state.owners.insert(connection, endpoint);

        let deliveries = match state.mode {
            NetworkMode::Online => match state.server.accept(connection, url) {
                Ok(deliveries) => deliveries,
                Err(reason) => vec![
                    (connection, TransportEvent::Error { connection, message: reason.clone() }),
                    (connection, TransportEvent::Closed { connection, reason: Some(reason) }),
                ],
            },
            NetworkMode::Unreachable => vec![
                (connection, TransportEvent::Error {
                    connection,
                    message: "connection refused".into(),
                }),
                (connection, TransportEvent::Closed { connection, reason: None }),
            ],
            NetworkMode::Manual => Vec::new(),
        };
        state.route(deliveries);
    }

    pub(crate) fn send(&self, connection: ConnectionId, frame: &str) {
        let mut state = self.lock();
        if state.mode == NetworkMode::Manual {
            return;
        }
        let deliveries = state.server.receive(connection, frame);
        state.route(deliveries);
    }

    pub(crate) fn close(&self, connection: ConnectionId) {
        let mut state = self.lock();
        let deliveries = state.server.leave(connection);
        state.route(deliveries);

        // The closing endpoint hears nothing more from this connection.
        if let Some(endpoint) = state.owners.remove(&connection)
            && let Some(queue) = state.queues.get_mut(&endpoint)
        {
            queue.retain(|event| event.connection() != connection);
        }
    }

    fn lock(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
