//! Simulated environment server.
//!
//! A minimal model of the backend: it tracks which minds are connected to
//! which environment, greets new connections with a `welcome`, and broadcasts
//! membership changes and chat to everyone in the room, sender included.
//!
//! The server is pure. Every method returns the deliveries it wants to make
//! and the [`crate::SimNetwork`] routes them.

use std::collections::BTreeMap;

use mindlink_client::{ConnectionId, TransportEvent};
use mindlink_proto::{EnvironmentSnapshot, InboundMessage, OutboundMessage};
use serde_json::Value;
use url::Url;

/// Event addressed to one connection.
pub type Delivery = (ConnectionId, TransportEvent);

/// First simulated second (2025-01-01T00:00:00Z).
const EPOCH_SECS: i64 = 1_735_689_600;

#[derive(Debug, Clone)]
struct Participant {
    connection: ConnectionId,
    gmid: String,
    mind_name: String,
}

/// Object update received by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectUpdate {
    /// Environment the sender was in.
    pub room_id: String,
    /// Display name of the sender.
    pub from_mind_name: String,
    /// Object name.
    pub object_name: String,
    /// Payload as sent.
    pub payload: Value,
}

/// In-memory environment server.
#[derive(Debug, Default)]
pub struct SimServer {
    rooms: BTreeMap<String, Vec<Participant>>,
    /// Simulated seconds elapsed. Advances once per stamped event.
    ticks: i64,
    objects: Vec<ObjectUpdate>,
}

impl SimServer {
    /// Create a server with no rooms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a connection for the endpoint in `url`.
    ///
    /// # Errors
    ///
    /// Returns a close reason if the URL is not an environment endpoint.
    pub fn accept(&mut self, connection: ConnectionId, url: &Url) -> Result<Vec<Delivery>, String> {
        let (room_id, gmid, mind_name) = parse_endpoint(url)?;

        let participants = self.rooms.entry(room_id.clone()).or_default();
        participants.push(Participant { connection, gmid, mind_name: mind_name.clone() });
        let present_minds = names(participants);
        tracing::debug!(%connection, room = %room_id, mind = %mind_name, "sim server accepted");

        let mut deliveries = vec![(connection, TransportEvent::Opened { connection })];
        let welcome = InboundMessage::Welcome {
            message: format!("Welcome to {room_id}, {mind_name}"),
            environment: Some(EnvironmentSnapshot {
                present_minds: present_minds.clone(),
                name: Some(room_id.clone()),
                description: None,
            }),
            timestamp: Some(self.stamp()),
        };
        deliveries.extend(frame_to(connection, &welcome));

        let joined =
            InboundMessage::MindJoined { mind_name, present_minds, timestamp: self.stamp() };
        deliveries.extend(self.broadcast(&room_id, Some(connection), &joined));
        Ok(deliveries)
    }

    /// Handle a text frame from a connection.
    pub fn receive(&mut self, connection: ConnectionId, frame: &str) -> Vec<Delivery> {
        let Some((room_id, sender)) = self.locate(connection) else {
            tracing::debug!(%connection, "frame from unknown connection");
            return Vec::new();
        };

        match OutboundMessage::decode(frame) {
            Ok(OutboundMessage::Chat { content, emotion }) => {
                let msg = InboundMessage::ChatMessage {
                    from_mind_name: sender,
                    content,
                    emotion,
                    timestamp: self.stamp(),
                };
                self.broadcast(&room_id, None, &msg)
            },
            Ok(OutboundMessage::UpdateObject { object_name, payload }) => {
                self.objects.push(ObjectUpdate {
                    room_id,
                    from_mind_name: sender,
                    object_name,
                    payload,
                });
                Vec::new()
            },
            Err(e) => {
                tracing::debug!(%connection, error = %e, "sim server dropped malformed frame");
                Vec::new()
            },
        }
    }

    /// Remove a connection and tell the rest of its room.
    pub fn leave(&mut self, connection: ConnectionId) -> Vec<Delivery> {
        let Some((room_id, mind_name)) = self.locate(connection) else {
            return Vec::new();
        };

        let present_minds = match self.rooms.get_mut(&room_id) {
            Some(participants) => {
                participants.retain(|p| p.connection != connection);
                names(participants)
            },
            None => Vec::new(),
        };

        let left = InboundMessage::MindLeft { mind_name, present_minds, timestamp: self.stamp() };
        self.broadcast(&room_id, None, &left)
    }

    /// Display names present in a room, in join order.
    pub fn presence(&self, room_id: &str) -> Vec<String> {
        self.rooms.get(room_id).map(|p| names(p)).unwrap_or_default()
    }

    /// Room a connection belongs to.
    pub fn room_of(&self, connection: ConnectionId) -> Option<&str> {
        self.rooms.iter().find_map(|(room_id, participants)| {
            participants.iter().any(|p| p.connection == connection).then_some(room_id.as_str())
        })
    }

    /// Participant id a connection joined with.
    pub fn gmid_of(&self, connection: ConnectionId) -> Option<&str> {
        self.rooms
            .values()
            .flatten()
            .find(|p| p.connection == connection)
            .map(|p| p.gmid.as_str())
    }

    /// Object updates received so far, in arrival order.
    pub fn object_updates(&self) -> &[ObjectUpdate] {
        &self.objects
    }

    fn locate(&self, connection: ConnectionId) -> Option<(String, String)> {
        self.rooms.iter().find_map(|(room_id, participants)| {
            participants
                .iter()
                .find(|p| p.connection == connection)
                .map(|p| (room_id.clone(), p.mind_name.clone()))
        })
    }

    fn broadcast(
        &self,
        room_id: &str,
        except: Option<ConnectionId>,
        msg: &InboundMessage,
    ) -> Vec<Delivery> {
        let Some(participants) = self.rooms.get(room_id) else {
            return Vec::new();
        };
        participants
            .iter()
            .filter(|p| Some(p.connection) != except)
            .flat_map(|p| frame_to(p.connection, msg))
            .collect()
    }

    fn stamp(&mut self) -> String {
        let secs = EPOCH_SECS + self.ticks;
        self.ticks += 1;
        chrono::DateTime::from_timestamp(secs, 0).map(|t| t.to_rfc3339()).unwrap_or_default()
    }
}

fn names(participants: &[Participant]) -> Vec<String> {
    participants.iter().map(|p| p.mind_name.clone()).collect()
}

fn frame_to(connection: ConnectionId, msg: &InboundMessage) -> Option<Delivery> {
    match msg.encode() {
        Ok(frame) => Some((connection, TransportEvent::Text { connection, frame })),
        Err(e) => {
            tracing::warn!(%connection, error = %e, "sim server failed to encode");
            None
        },
    }
}

/// Extract `(room_id, gmid, mind_name)` from an environment socket URL.
fn parse_endpoint(url: &Url) -> Result<(String, String, String), String> {
    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();
    let room_id = match segments.as_slice() {
        [.., "environments", room_id, "ws"] => percent_decode(room_id),
        _ => return Err(format!("not an environment endpoint: {}", url.path())),
    };

    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("missing {key}"))
    };

    Ok((room_id, query("gmid")?, query("mind_name")?))
}

fn percent_decode(segment: &str) -> String {
    url::form_urlencoded::parse(format!("x={}", segment.replace('+', "%2B")).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}
