//! Property-based tests for multi-client sessions.
//!
//! Random interleavings of user commands, partial network delivery and server
//! drops across several clients. [`SimClient`] checks the standard invariants
//! after every step; once the network settles, every joined client must agree
//! with the server's roster.

use mindlink_app::{Command, SessionStatus};
use mindlink_client::ClientConfig;
use mindlink_harness::{SimClient, SimNetwork, settle};
use proptest::prelude::*;

const CLIENTS: usize = 3;
const NAMES: [&str; CLIENTS] = ["Nova", "Atlas", "Vega"];

#[derive(Debug, Clone)]
enum Op {
    Join { client: usize, room: &'static str },
    Leave { client: usize },
    Chat { client: usize, content: String },
    Pump { client: usize },
    Drop { client: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let client = 0..CLIENTS;
    prop_oneof![
        3 => (client.clone(), prop::sample::select(vec!["R1", "R2"]))
            .prop_map(|(client, room)| Op::Join { client, room }),
        1 => client.clone().prop_map(|client| Op::Leave { client }),
        3 => (client.clone(), "[a-z]{1,6}").prop_map(|(client, content)| Op::Chat { client, content }),
        4 => client.clone().prop_map(|client| Op::Pump { client }),
        1 => client.prop_map(|client| Op::Drop { client }),
    ]
}

fn clients(network: &SimNetwork) -> Vec<SimClient> {
    (0..CLIENTS)
        .map(|i| SimClient::new(i as u64, network, ClientConfig::new("ws://sim.local").unwrap()))
        .collect()
}

fn apply(network: &SimNetwork, clients: &mut [SimClient], op: Op) -> Result<(), TestCaseError> {
    let result = match op {
        Op::Join { client, room } => clients[client]
            .command(Command::Join {
                room_id: room.into(),
                gmid: format!("GMID-{client}"),
                mind_name: NAMES[client].into(),
            })
            .map(|_| ()),
        Op::Leave { client } => clients[client].command(Command::Leave).map(|_| ()),
        Op::Chat { client, content } => {
            clients[client].command(Command::Chat { content, emotion: None }).map(|_| ())
        },
        Op::Pump { client } => clients[client].pump().map(|_| ()),
        Op::Drop { client } => {
            if let Some(connection) =
                clients[client].transport().and_then(|t| t.latest_connection())
            {
                network.drop_connection(connection, None);
            }
            Ok(())
        },
    };
    result.map_err(|e| TestCaseError::fail(e.to_string()))
}

proptest! {
    #[test]
    fn prop_invariants_hold_under_interleaving(
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let network = SimNetwork::new();
        let mut clients = clients(&network);

        for op in ops {
            apply(&network, &mut clients, op)?;
        }
        settle(&mut clients).map_err(|e| TestCaseError::fail(e.to_string()))?;

        for client in &clients {
            let app = client.app();
            if let SessionStatus::Joined { welcomed: true } = app.status() {
                let room = app.membership().map(|m| m.room_id().to_string()).unwrap_or_default();
                let expected = network.presence(&room);
                prop_assert_eq!(app.presence(), expected.as_slice());
            }
            prop_assert!(client.transport().map_or(0, |t| t.active_connections()) <= 1);
        }
    }

    #[test]
    fn prop_everyone_leaving_empties_rooms(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let network = SimNetwork::new();
        let mut clients = clients(&network);

        for op in ops {
            apply(&network, &mut clients, op)?;
        }
        for client in &mut clients {
            client.command(Command::Leave).map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
        settle(&mut clients).map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert!(network.presence("R1").is_empty());
        prop_assert!(network.presence("R2").is_empty());
        for client in &clients {
            prop_assert_eq!(client.app().status(), SessionStatus::Idle);
            prop_assert!(client.app().log().is_empty());
        }
    }
}
