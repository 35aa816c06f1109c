//! Fuzz target for connection and session lifecycle
//!
//! Drives a Bridge and App with arbitrary interleavings of user operations and
//! transport events, including events for stale connections.
//!
//! # Invariants
//!
//! - App status agrees with the bridge's connection state after every step
//! - Idle sessions show nobody present
//! - The transport never has more than one live connection
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mindlink_app::{App, AppAction, AppEvent, Bridge, SessionStatus};
use mindlink_client::{
    ClientConfig, ConnectionId, ConnectionState, Transport, TransportError, TransportEvent,
};
use url::Url;

#[derive(Debug, Default)]
struct FuzzTransport {
    live: Vec<ConnectionId>,
    opened: Vec<ConnectionId>,
}

impl Transport for FuzzTransport {
    fn open(&mut self, connection: ConnectionId, _url: &Url) -> Result<(), TransportError> {
        self.live.push(connection);
        self.opened.push(connection);
        Ok(())
    }

    fn send_text(&mut self, connection: ConnectionId, _frame: String) -> Result<(), TransportError> {
        if self.live.contains(&connection) {
            Ok(())
        } else {
            Err(TransportError::Send("closed".into()))
        }
    }

    fn close(&mut self, connection: ConnectionId) {
        self.live.retain(|c| *c != connection);
    }
}

#[derive(Debug, Arbitrary)]
enum Op {
    Join { room: u8 },
    Leave,
    Chat(String),
    Opened { back: u8 },
    Text { back: u8, frame: String },
    Error { back: u8 },
    Closed { back: u8 },
}

fn drive(app: &mut App, bridge: &mut Bridge<FuzzTransport>, actions: Vec<AppAction>) {
    let mut pending = actions;
    while !pending.is_empty() {
        for action in std::mem::take(&mut pending) {
            for event in bridge.process_app_action(action) {
                pending.extend(app.handle(event));
            }
        }
    }
}

fn apply_events(app: &mut App, bridge: &mut Bridge<FuzzTransport>, events: Vec<AppEvent>) {
    for event in events {
        let actions = app.handle(event);
        drive(app, bridge, actions);
    }
}

/// Connection opened `back` cycles ago, if any.
fn connection(bridge: &Bridge<FuzzTransport>, back: u8) -> Option<ConnectionId> {
    let opened = &bridge.transport()?.opened;
    opened.iter().rev().nth(usize::from(back % 4)).copied()
}

fuzz_target!(|ops: Vec<Op>| {
    let Ok(config) = ClientConfig::new("ws://fuzz.local") else {
        return;
    };
    let mut app = App::new();
    let mut bridge = Bridge::new(FuzzTransport::default(), config);

    for op in ops {
        match op {
            Op::Join { room } => {
                let room = format!("R{}", room % 3);
                if let Ok(actions) = app.join(&room, "GMID-1", "Nova") {
                    drive(&mut app, &mut bridge, actions);
                }
            },
            Op::Leave => {
                let actions = app.leave();
                drive(&mut app, &mut bridge, actions);
            },
            Op::Chat(content) => {
                let actions = app.send_chat(&content, None);
                drive(&mut app, &mut bridge, actions);
            },
            Op::Opened { back } => {
                let Some(connection) = connection(&bridge, back) else { continue };
                let events = bridge.handle_transport_event(TransportEvent::Opened { connection });
                apply_events(&mut app, &mut bridge, events);
            },
            Op::Text { back, frame } => {
                let Some(connection) = connection(&bridge, back) else { continue };
                let events = bridge.handle_transport_event(TransportEvent::Text { connection, frame });
                apply_events(&mut app, &mut bridge, events);
            },
            Op::Error { back } => {
                let Some(connection) = connection(&bridge, back) else { continue };
                let event = TransportEvent::Error { connection, message: "fuzz".into() };
                let events = bridge.handle_transport_event(event);
                apply_events(&mut app, &mut bridge, events);
            },
            Op::Closed { back } => {
                let Some(connection) = connection(&bridge, back) else { continue };
                let event = TransportEvent::Closed { connection, reason: None };
                let events = bridge.handle_transport_event(event);
                apply_events(&mut app, &mut bridge, events);
            },
        }

        let expected = match app.status() {
            SessionStatus::Idle => ConnectionState::Closed,
            SessionStatus::Connecting => ConnectionState::Connecting,
            SessionStatus::Joined { .. } => ConnectionState::Open,
        };
        assert_eq!(bridge.connection_state(), expected, "status {:?}", app.status());
        if app.log().is_empty() {
            assert!(app.presence().is_empty());
        }
        assert!(bridge.transport().map_or(0, |t| t.live.len()) <= 1);
    }
});
