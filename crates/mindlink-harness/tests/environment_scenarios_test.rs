//! End-to-end scenarios against the simulated environment server.
//!
//! # Test Strategy
//!
//! Each test drives one or more [`SimClient`]s the way a user would:
//! 1. Issue commands (`/join`, chat, `/leave`)
//! 2. Let the runtime route them through App → Bridge → ConnectionManager
//! 3. Settle the network so server broadcasts reach every client
//! 4. Verify the rendered state
//!
//! Every step is also checked against the standard invariants.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use mindlink_app::{App, ChatOrigin, Command, EchoPolicy, LogEntry, SessionStatus};
use mindlink_client::{
    ClientConfig, ConnectionCallbacks, ConnectionManager, ConnectionState, Transport,
};
use mindlink_harness::{NetworkMode, SimClient, SimClock, SimNetwork, settle};
use url::Url;

fn config() -> ClientConfig {
    ClientConfig::new("ws://sim.local").unwrap()
}

fn join(room: &str, gmid: &str, name: &str) -> Command {
    Command::Join { room_id: room.into(), gmid: gmid.into(), mind_name: name.into() }
}

fn chat(content: &str) -> Command {
    Command::Chat { content: content.into(), emotion: None }
}

/// One line per log entry.
fn transcript(app: &App) -> String {
    app.log()
        .iter()
        .map(|entry| match entry {
            LogEntry::System { text, .. } => format!("* {text}"),
            LogEntry::Chat { sender, content, origin, .. } => {
                format!("<{sender}> {content} [{origin:?}]")
            },
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Nova and Atlas both joined to R1 and settled.
fn nova_and_atlas(network: &SimNetwork, nova_app: App) -> Vec<SimClient> {
    let mut clients = vec![
        SimClient::new(1, network, config()).with_app(nova_app),
        SimClient::new(2, network, config()),
    ];
    clients[0].command(join("R1", "GMID-1", "Nova")).unwrap();
    settle(&mut clients).unwrap();
    clients[1].command(join("R1", "GMID-2", "Atlas")).unwrap();
    settle(&mut clients).unwrap();
    clients
}

fn sim_app() -> App {
    App::new().with_clock(Arc::new(SimClock::new()))
}

#[test]
fn welcome_populates_log_and_presence() {
    let network = SimNetwork::new();
    let mut nova = SimClient::new(1, &network, config());

    nova.command(join("R1", "GMID-1", "Nova")).unwrap();
    assert_eq!(nova.app().status(), SessionStatus::Connecting);
    settle(std::slice::from_mut(&mut nova)).unwrap();

    let app = nova.app();
    assert_eq!(app.status(), SessionStatus::Joined { welcomed: true });
    assert_eq!(app.log().len(), 1);
    assert!(!app.log()[0].is_chat());
    assert_eq!(app.presence(), ["Nova"]);

    let transport = nova.transport().unwrap();
    assert_eq!(
        transport.opened()[0].as_str(),
        "ws://sim.local/environments/R1/ws?gmid=GMID-1&mind_name=Nova"
    );
}

#[test]
fn mind_joined_appends_notice_and_updates_presence() {
    let network = SimNetwork::new();
    let clients = nova_and_atlas(&network, sim_app());
    let nova = clients[0].app();

    assert_eq!(nova.log().len(), 2);
    assert_eq!(nova.log()[1], LogEntry::System {
        text: "Atlas joined the environment".into(),
        timestamp: nova.log()[1].timestamp().map(str::to_string),
    });
    assert_eq!(nova.presence(), ["Nova", "Atlas"]);
    assert_eq!(clients[1].app().presence(), ["Nova", "Atlas"]);
}

#[test]
fn local_chat_is_logged_before_broadcasts() {
    let network = SimNetwork::new();
    let mut clients = nova_and_atlas(&network, sim_app());

    clients[0].command(chat("hello")).unwrap();

    // Appended synchronously, before the server has broadcast anything.
    let last = clients[0].app().log().last().unwrap();
    assert!(matches!(
        last,
        LogEntry::Chat { sender, content, origin: ChatOrigin::Local, .. }
            if sender == "Nova" && content == "hello"
    ));

    settle(&mut clients).unwrap();
    clients[1].command(chat("hi")).unwrap();
    settle(&mut clients).unwrap();

    // The server echoes chat back to its sender; the default policy keeps it.
    insta::assert_snapshot!(transcript(clients[0].app()), @r"
    * Welcome to R1, Nova
    * Atlas joined the environment
    <Nova> hello [Local]
    <Nova> hello [Remote]
    <Atlas> hi [Remote]
    ");
}

#[test]
fn own_echo_suppressed_when_enabled() {
    let network = SimNetwork::new();
    let app = sim_app().with_echo_policy(EchoPolicy::SuppressOwnEcho);
    let mut clients = nova_and_atlas(&network, app);

    clients[0].command(chat("hello")).unwrap();
    settle(&mut clients).unwrap();
    clients[1].command(chat("hi")).unwrap();
    settle(&mut clients).unwrap();

    insta::assert_snapshot!(transcript(clients[0].app()), @r"
    * Welcome to R1, Nova
    * Atlas joined the environment
    <Nova> hello [Local]
    <Atlas> hi [Remote]
    ");

    // Atlas sees Nova's chat exactly once.
    insta::assert_snapshot!(transcript(clients[1].app()), @r"
    * Welcome to R1, Atlas
    <Nova> hello [Remote]
    <Atlas> hi [Local]
    <Atlas> hi [Remote]
    ");
}

#[test]
fn repeated_disconnect_notifies_once() {
    let network = SimNetwork::new();
    let disconnects = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&disconnects);
    let callbacks = ConnectionCallbacks::new().on_disconnect(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let url = Url::parse("ws://sim.local/environments/R1/ws?gmid=GMID-1&mind_name=Nova").unwrap();
    let transport = network.transport();
    let endpoint = transport.endpoint();
    let mut manager = ConnectionManager::new(transport, url, callbacks);

    manager.connect().unwrap();
    while let Some(event) = network.pop_event(endpoint) {
        manager.handle_transport_event(event);
    }
    assert_eq!(manager.state(), ConnectionState::Open);

    manager.disconnect();
    manager.disconnect();

    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    assert_eq!(manager.state(), ConnectionState::Closed);
    assert!(network.presence("R1").is_empty());
}

#[test]
fn leave_resets_session_and_notifies_room() {
    let network = SimNetwork::new();
    let mut clients = nova_and_atlas(&network, sim_app());

    clients[0].command(Command::Leave).unwrap();
    settle(&mut clients).unwrap();

    let nova = clients[0].app();
    assert_eq!(nova.status(), SessionStatus::Idle);
    assert!(nova.log().is_empty());
    assert!(nova.presence().is_empty());
    assert_eq!(clients[0].connection_state(), ConnectionState::Closed);

    let atlas = clients[1].app();
    assert_eq!(atlas.log().last().unwrap(), &LogEntry::System {
        text: "Nova left the environment".into(),
        timestamp: atlas.log().last().unwrap().timestamp().map(str::to_string),
    });
    assert_eq!(atlas.presence(), ["Atlas"]);
}

#[test]
fn server_drop_keeps_log_and_presence() {
    let network = SimNetwork::new();
    let mut clients = nova_and_atlas(&network, sim_app());
    let log_len = clients[0].app().log().len();
    let connection = clients[0].transport().unwrap().latest_connection().unwrap();

    network.drop_connection(connection, Some("server restart".into()));
    settle(&mut clients).unwrap();

    let nova = clients[0].app();
    assert_eq!(nova.status(), SessionStatus::Idle);
    assert_eq!(nova.log().len(), log_len);
    assert_eq!(nova.presence(), ["Nova", "Atlas"]);
    assert_eq!(nova.status_message(), Some("Disconnected from environment"));
    assert_eq!(clients[0].transport().unwrap().active_connections(), 0);
    assert_eq!(clients[1].app().presence(), ["Atlas"]);
}

#[test]
fn switching_rooms_tears_down_previous_membership() {
    let network = SimNetwork::new();
    let mut clients = nova_and_atlas(&network, sim_app());
    let first = clients[0].transport().unwrap().latest_connection().unwrap();

    clients[0].command(join("R2", "GMID-1", "Nova")).unwrap();
    assert!(clients[0].app().log().is_empty());
    settle(&mut clients).unwrap();

    let transport = clients[0].transport().unwrap();
    assert_eq!(transport.closed(), [first]);
    assert_eq!(transport.opened().len(), 2);
    assert_eq!(transport.active_connections(), 1);
    assert_eq!(clients[0].app().presence(), ["Nova"]);
    assert_eq!(network.presence("R2"), ["Nova"]);
    assert_eq!(clients[1].app().presence(), ["Atlas"]);
}

#[test]
fn unreachable_server_returns_to_idle() {
    let network = SimNetwork::with_mode(NetworkMode::Unreachable);
    let mut nova = SimClient::new(1, &network, config());

    nova.command(join("R1", "GMID-1", "Nova")).unwrap();
    settle(std::slice::from_mut(&mut nova)).unwrap();

    assert_eq!(nova.app().status(), SessionStatus::Idle);
    assert!(
        nova.renders()
            .iter()
            .filter_map(|r| r.status_message.as_deref())
            .any(|m| m.starts_with("Error:") && m.contains("connection refused"))
    );
    assert_eq!(nova.app().status_message(), Some("Disconnected from environment"));
}

#[test]
fn failed_open_returns_to_idle_immediately() {
    let network = SimNetwork::new();
    let transport = network.transport().refusing_opens();
    let mut nova = SimClient::with_transport(1, transport, config());

    nova.command(join("R1", "GMID-1", "Nova")).unwrap();

    assert_eq!(nova.app().status(), SessionStatus::Idle);
    assert_eq!(nova.connection_state(), ConnectionState::Closed);
    assert!(network.is_settled());
}

#[test]
fn chat_while_idle_is_not_sent() {
    let network = SimNetwork::new();
    let mut nova = SimClient::new(1, &network, config());

    nova.command(chat("anyone?")).unwrap();

    assert!(nova.app().log().is_empty());
    assert_eq!(nova.app().status_message(), Some("Not in an environment"));
    assert!(nova.transport().unwrap().sent().is_empty());
}

#[test]
fn object_updates_reach_server() {
    let network = SimNetwork::new();
    let mut nova = SimClient::new(1, &network, config());
    nova.command(join("R1", "GMID-1", "Nova")).unwrap();
    settle(std::slice::from_mut(&mut nova)).unwrap();

    let payload = serde_json::json!({"x": 3, "y": 4});
    nova.command(Command::UpdateObject { object_name: "board".into(), payload: payload.clone() })
        .unwrap();

    let updates = network.object_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].room_id, "R1");
    assert_eq!(updates[0].from_mind_name, "Nova");
    assert_eq!(updates[0].object_name, "board");
    assert_eq!(updates[0].payload, payload);
}

#[test]
fn manual_network_waits_for_injected_events() {
    let network = SimNetwork::with_mode(NetworkMode::Manual);
    let mut nova = SimClient::new(1, &network, config());

    nova.command(join("R1", "GMID-1", "Nova")).unwrap();
    settle(std::slice::from_mut(&mut nova)).unwrap();
    assert_eq!(nova.app().status(), SessionStatus::Connecting);

    let connection = nova.transport().unwrap().latest_connection().unwrap();
    network.inject(mindlink_client::TransportEvent::Opened { connection });
    network.inject(mindlink_client::TransportEvent::Text {
        connection,
        frame: r#"{"type":"welcome","message":"hi","environment":{"present_minds":["Nova","Ghost"]}}"#
            .into(),
    });
    settle(std::slice::from_mut(&mut nova)).unwrap();

    assert_eq!(nova.app().status(), SessionStatus::Joined { welcomed: true });
    assert_eq!(nova.app().presence(), ["Nova", "Ghost"]);
}

#[test]
fn sim_transport_rejects_sends_after_close() {
    let network = SimNetwork::new();
    let mut transport = network.transport();
    let connection = mindlink_client::ConnectionId::next();
    let url = Url::parse("ws://sim.local/environments/R1/ws?gmid=G&mind_name=Nova").unwrap();

    transport.open(connection, &url).unwrap();
    transport.close(connection);

    assert!(transport.send_text(connection, "{}".into()).is_err());
}
