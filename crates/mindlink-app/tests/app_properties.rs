//! Property-based tests for the App state machine.
//!
//! Tests verify that invariants hold under arbitrary server event sequences.

use mindlink_app::{App, AppAction, AppEvent, ChatOrigin, LogEntry, SessionStatus};
use mindlink_proto::{EnvironmentSnapshot, InboundMessage};
use proptest::prelude::*;

fn name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Nova", "Atlas", "Echo", "Vega", "Orion"]).prop_map(String::from)
}

fn minds() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(name(), 0..5)
}

/// Generate random server messages.
fn message_strategy() -> impl Strategy<Value = InboundMessage> {
    prop_oneof![
        1 => (any::<bool>(), minds()).prop_map(|(with_env, present_minds)| InboundMessage::Welcome {
            message: "welcome".into(),
            environment: with_env.then(|| EnvironmentSnapshot {
                present_minds,
                ..Default::default()
            }),
            timestamp: None,
        }),
        2 => (name(), minds()).prop_map(|(mind_name, present_minds)| InboundMessage::MindJoined {
            mind_name,
            present_minds,
            timestamp: "t".into(),
        }),
        2 => (name(), minds()).prop_map(|(mind_name, present_minds)| InboundMessage::MindLeft {
            mind_name,
            present_minds,
            timestamp: "t".into(),
        }),
        4 => (name(), "[a-z ]{1,12}").prop_map(|(from_mind_name, content)| {
            InboundMessage::ChatMessage {
                from_mind_name,
                content,
                emotion: None,
                timestamp: "t".into(),
            }
        }),
    ]
}

fn joined_app() -> App {
    let mut app = App::new();
    app.join("R1", "GMID-1", "Nova").unwrap();
    app.handle(AppEvent::Connected);
    app
}

/// Presence expected after applying `messages` from an empty start.
fn expected_presence(messages: &[InboundMessage]) -> Vec<String> {
    let mut presence = Vec::new();
    for msg in messages {
        if let Some(minds) = msg.present_minds() {
            presence = minds.to_vec();
        }
    }
    presence
}

proptest! {
    #[test]
    fn prop_log_follows_arrival_order(messages in prop::collection::vec(message_strategy(), 0..40)) {
        let mut app = joined_app();

        for msg in &messages {
            app.handle(AppEvent::MessageReceived(msg.clone()));
        }

        // Every message appends exactly one entry, in order.
        prop_assert_eq!(app.log().len(), messages.len());
        for (entry, msg) in app.log().iter().zip(&messages) {
            match (entry, msg) {
                (
                    LogEntry::Chat { sender, content, origin, .. },
                    InboundMessage::ChatMessage { from_mind_name, content: sent, .. },
                ) => {
                    prop_assert_eq!(sender, from_mind_name);
                    prop_assert_eq!(content, sent);
                    prop_assert_eq!(*origin, ChatOrigin::Remote);
                },
                (LogEntry::System { .. }, InboundMessage::ChatMessage { .. }) => {
                    prop_assert!(false, "chat logged as system entry");
                },
                (LogEntry::Chat { .. }, _) => prop_assert!(false, "system event logged as chat"),
                (LogEntry::System { .. }, _) => {},
            }
        }
    }

    #[test]
    fn prop_presence_is_last_snapshot(messages in prop::collection::vec(message_strategy(), 0..40)) {
        let mut app = joined_app();

        for (i, msg) in messages.iter().enumerate() {
            app.handle(AppEvent::MessageReceived(msg.clone()));
            let expected = expected_presence(&messages[..=i]);
            prop_assert_eq!(app.presence(), expected.as_slice());
        }
    }

    #[test]
    fn prop_leave_resets_log(
        messages in prop::collection::vec(message_strategy(), 0..20),
        leaves in 1usize..4,
    ) {
        let mut app = joined_app();
        for msg in messages {
            app.handle(AppEvent::MessageReceived(msg));
        }

        for _ in 0..leaves {
            let actions = app.leave();
            prop_assert_eq!(actions, vec![AppAction::Disconnect, AppAction::Render]);
            prop_assert!(app.log().is_empty());
            prop_assert!(app.presence().is_empty());
            prop_assert_eq!(app.status(), SessionStatus::Idle);
        }
    }

    #[test]
    fn prop_send_appends_before_any_broadcast(
        contents in prop::collection::vec("[a-z]{1,8}", 1..10),
        messages in prop::collection::vec(message_strategy(), 0..10),
    ) {
        let mut app = joined_app();
        for msg in messages {
            app.handle(AppEvent::MessageReceived(msg));
        }

        for content in contents {
            let before = app.log().len();
            let actions = app.send_chat(&content, None);

            prop_assert_eq!(app.log().len(), before + 1);
            let is_local_echo = matches!(
                app.log().last(),
                Some(LogEntry::Chat { origin: ChatOrigin::Local, content: c, .. }) if *c == content
            );
            prop_assert!(is_local_echo);
            let sends_chat = matches!(
                actions.first(),
                Some(AppAction::SendChat { content: c, .. }) if *c == content
            );
            prop_assert!(sends_chat);
        }
    }

    #[test]
    fn prop_idle_ignores_messages(messages in prop::collection::vec(message_strategy(), 0..20)) {
        let mut app = App::new();
        for msg in messages {
            prop_assert!(app.handle(AppEvent::MessageReceived(msg)).is_empty());
        }
        prop_assert!(app.log().is_empty());
        prop_assert!(app.presence().is_empty());
    }
}
