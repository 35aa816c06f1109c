//! Line rendering.
//!
//! A terminal can only append, so [`View`] remembers what it has already
//! printed and turns each render of the [`App`] into the lines that are new
//! since the last one.

use mindlink_app::{App, LogEntry, SessionStatus};

/// Incremental renderer for an [`App`].
#[derive(Debug, Default)]
pub struct View {
    /// Log entries already printed.
    printed: usize,
    status: Option<&'static str>,
    status_message: Option<String>,
    presence: Vec<String>,
}

impl View {
    /// Create a view that has printed nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for the current state of `app`.
    pub fn update(&mut self, app: &App) -> Vec<String> {
        let mut lines = Vec::new();

        let label = status_label(app.status());
        if self.status != Some(label) {
            lines.push(status_line(app));
            self.status = Some(label);
        }

        let message = app.status_message();
        if let Some(text) = message
            && self.status_message.as_deref() != Some(text)
        {
            lines.push(format!("-- {text}"));
        }
        self.status_message = message.map(str::to_string);

        // A shorter log means a new session started.
        let log = app.log();
        if log.len() < self.printed {
            self.printed = 0;
        }
        lines.extend(log[self.printed..].iter().map(format_entry));
        self.printed = log.len();

        if self.presence != app.presence() {
            self.presence = app.presence().to_vec();
            if !self.presence.is_empty() {
                lines.push(format!("present: {}", self.presence.join(", ")));
            }
        }

        lines
    }
}

fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "idle",
        SessionStatus::Connecting => "connecting",
        SessionStatus::Joined { .. } => "joined",
    }
}

fn status_line(app: &App) -> String {
    let label = status_label(app.status());
    match app.membership() {
        Some(m) if app.status() != SessionStatus::Idle => {
            format!("[{label}] {} as {}", m.room_id(), m.mind_name())
        },
        _ => format!("[{label}] /join <room> <gmid> <name> to enter an environment"),
    }
}

/// Format one log entry.
pub fn format_entry(entry: &LogEntry) -> String {
    match entry {
        LogEntry::System { text, .. } => format!("* {text}"),
        LogEntry::Chat { sender, content, emotion, timestamp, .. } => {
            let time = clock_time(timestamp);
            match emotion {
                Some(emotion) => format!("[{time}] <{sender} ({emotion})> {content}"),
                None => format!("[{time}] <{sender}> {content}"),
            }
        },
    }
}

/// `HH:MM:SS` of an RFC 3339 timestamp, or the raw text if it does not parse.
fn clock_time(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map_or_else(|_| timestamp.to_string(), |t| t.format("%H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use mindlink_app::{AppEvent, ChatOrigin};
    use mindlink_client::{EnvironmentSnapshot, InboundMessage};

    use super::*;

    fn welcome(minds: &[&str]) -> AppEvent {
        AppEvent::MessageReceived(InboundMessage::Welcome {
            message: "Welcome to R1".into(),
            environment: Some(EnvironmentSnapshot {
                present_minds: minds.iter().map(|m| (*m).to_string()).collect(),
                ..Default::default()
            }),
            timestamp: None,
        })
    }

    #[test]
    fn renders_only_new_lines() {
        let mut view = View::new();
        let mut app = App::new();
        let mut transcript = view.update(&app);

        app.join("R1", "GMID-1", "Nova").unwrap();
        transcript.extend(view.update(&app));
        app.handle(AppEvent::Connected);
        transcript.extend(view.update(&app));
        app.handle(welcome(&["Nova"]));
        transcript.extend(view.update(&app));
        app.handle(AppEvent::MessageReceived(InboundMessage::ChatMessage {
            from_mind_name: "Atlas".into(),
            content: "hi".into(),
            emotion: Some("joy".into()),
            timestamp: "2025-01-01T09:30:05Z".into(),
        }));
        transcript.extend(view.update(&app));

        // Nothing changed, nothing printed.
        assert!(view.update(&app).is_empty());

        insta::assert_snapshot!(transcript.join("\n"), @r"
        [idle] /join <room> <gmid> <name> to enter an environment
        [connecting] R1 as Nova
        -- Joining R1 as Nova...
        [joined] R1 as Nova
        -- Connected
        * Welcome to R1
        present: Nova
        [09:30:05] <Atlas (joy)> hi
        ");
    }

    #[test]
    fn rejoin_prints_new_session_from_start() {
        let mut view = View::new();
        let mut app = App::new();
        app.join("R1", "G", "Nova").unwrap();
        app.handle(AppEvent::Connected);
        app.handle(welcome(&["Nova"]));
        view.update(&app);

        // The runtime renders after every step, so the view sees the empty log.
        app.join("R2", "G", "Nova").unwrap();
        let mut lines = view.update(&app);
        app.handle(AppEvent::Connected);
        lines.extend(view.update(&app));
        app.handle(welcome(&["Nova", "Vega"]));
        lines.extend(view.update(&app));

        assert_eq!(lines, vec![
            "[connecting] R2 as Nova".to_string(),
            "-- Joining R2 as Nova...".to_string(),
            "[joined] R2 as Nova".to_string(),
            "-- Connected".to_string(),
            "* Welcome to R1".to_string(),
            "present: Nova, Vega".to_string(),
        ]);
    }

    #[test]
    fn unparseable_timestamp_is_shown_raw() {
        let entry = LogEntry::Chat {
            sender: "Nova".into(),
            content: "hello".into(),
            emotion: None,
            timestamp: "later".into(),
            origin: ChatOrigin::Local,
        };
        assert_eq!(format_entry(&entry), "[later] <Nova> hello");
    }
}
