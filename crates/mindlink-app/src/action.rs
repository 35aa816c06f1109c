//! Application side-effects and intents.
//!
//! [`AppAction`]s are instructions produced by the [`crate::App`] state machine
//! for the runtime to execute.

use mindlink_client::Membership;
use serde_json::Value;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Open a connection for this membership.
    Connect {
        /// Environment, participant and display name.
        membership: Membership,
    },

    /// Close the current connection.
    Disconnect,

    /// Send a chat message.
    SendChat {
        /// Message text.
        content: String,
        /// Optional emotion tag.
        emotion: Option<String>,
    },

    /// Update a shared environment object.
    UpdateObject {
        /// Object name.
        object_name: String,
        /// Arbitrary JSON payload.
        payload: Value,
    },
}
