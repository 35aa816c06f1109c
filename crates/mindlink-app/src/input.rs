//! Line commands.
//!
//! Frontends read lines of text and parse them into [`Command`]s. Lines
//! starting with `/` are commands; anything else is sent as chat.

use serde_json::Value;
use thiserror::Error;

/// A parsed user command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `/join <room> <gmid> <name...>`
    Join {
        /// Environment identifier.
        room_id: String,
        /// Participant identifier.
        gmid: String,
        /// Display name. May contain spaces.
        mind_name: String,
    },

    /// `/leave`
    Leave,

    /// Plain text, or `/emote <emotion> <text...>`.
    Chat {
        /// Message text.
        content: String,
        /// Emotion tag from `/emote`.
        emotion: Option<String>,
    },

    /// `/object <name> <json>`
    UpdateObject {
        /// Object name.
        object_name: String,
        /// Parsed JSON payload.
        payload: Value,
    },

    /// `/quit`
    Quit,
}

/// Errors from parsing a command line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Command is missing arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// `/object` payload is not valid JSON.
    #[error("invalid object payload: {0}")]
    InvalidPayload(String),

    /// Unrecognized `/command`.
    #[error("unknown command: /{0}")]
    Unknown(String),
}

const JOIN_USAGE: &str = "/join <room> <gmid> <name>";
const EMOTE_USAGE: &str = "/emote <emotion> <text>";
const OBJECT_USAGE: &str = "/object <name> <json>";

impl Command {
    /// Parse one input line. Returns `None` for blank lines.
    ///
    /// # Errors
    ///
    /// - `CommandError::Usage` if a command lacks arguments
    /// - `CommandError::InvalidPayload` if an `/object` payload is not JSON
    /// - `CommandError::Unknown` for unrecognized commands
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Self::Chat { content: line.to_string(), emotion: None }));
        };

        let (name, args) = split_word(rest);
        let command = match name {
            "join" => {
                let (room_id, args) = split_word(args);
                let (gmid, mind_name) = split_word(args);
                if room_id.is_empty() || gmid.is_empty() || mind_name.is_empty() {
                    return Err(CommandError::Usage(JOIN_USAGE));
                }
                Self::Join {
                    room_id: room_id.to_string(),
                    gmid: gmid.to_string(),
                    mind_name: mind_name.to_string(),
                }
            },
            "leave" => Self::Leave,
            "quit" | "exit" => Self::Quit,
            "emote" => {
                let (emotion, content) = split_word(args);
                if emotion.is_empty() || content.is_empty() {
                    return Err(CommandError::Usage(EMOTE_USAGE));
                }
                Self::Chat { content: content.to_string(), emotion: Some(emotion.to_string()) }
            },
            "object" => {
                let (object_name, json) = split_word(args);
                if object_name.is_empty() || json.is_empty() {
                    return Err(CommandError::Usage(OBJECT_USAGE));
                }
                let payload = serde_json::from_str(json)
                    .map_err(|e| CommandError::InvalidPayload(e.to_string()))?;
                Self::UpdateObject { object_name: object_name.to_string(), payload }
            },
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

/// Split off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(
            Command::parse("  hello there ").unwrap(),
            Some(Command::Chat { content: "hello there".into(), emotion: None })
        );
    }

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn join_keeps_spaces_in_name() {
        assert_eq!(
            Command::parse("/join R1 GMID-1 Nova Prime").unwrap(),
            Some(Command::Join {
                room_id: "R1".into(),
                gmid: "GMID-1".into(),
                mind_name: "Nova Prime".into(),
            })
        );
    }

    #[test]
    fn join_without_name_is_usage_error() {
        assert_eq!(Command::parse("/join R1 GMID-1"), Err(CommandError::Usage(JOIN_USAGE)));
    }

    #[test]
    fn emote_carries_emotion() {
        assert_eq!(
            Command::parse("/emote joy we did it").unwrap(),
            Some(Command::Chat { content: "we did it".into(), emotion: Some("joy".into()) })
        );
    }

    #[test]
    fn object_parses_json_payload() {
        assert_eq!(
            Command::parse(r#"/object board {"x": 1, "y": [2, 3]}"#).unwrap(),
            Some(Command::UpdateObject {
                object_name: "board".into(),
                payload: json!({"x": 1, "y": [2, 3]}),
            })
        );
    }

    #[test]
    fn object_rejects_bad_json() {
        assert!(matches!(
            Command::parse("/object board {nope"),
            Err(CommandError::InvalidPayload(_))
        ));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(Command::parse("/dance"), Err(CommandError::Unknown("dance".into())));
    }

    #[test]
    fn leave_and_quit() {
        assert_eq!(Command::parse("/leave").unwrap(), Some(Command::Leave));
        assert_eq!(Command::parse("/quit").unwrap(), Some(Command::Quit));
    }
}
