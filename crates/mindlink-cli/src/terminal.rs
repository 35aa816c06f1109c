//! Terminal driver for the CLI.
//!
//! Implements the [`Driver`] trait over line input and an appending writer.
//! Transport events from [`WsTransport`](mindlink_client::ws::WsTransport) and
//! typed lines are multiplexed with `tokio::select!`, transport first.

use std::{
    collections::VecDeque,
    io::{self, Write},
};

use mindlink_app::{App, Command, Driver, Input};
use mindlink_client::ws::TransportEvents;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::view::View;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error writing to the terminal.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver<W> {
    lines: mpsc::UnboundedReceiver<String>,
    events: TransportEvents,
    /// Commands to run before reading input.
    queued: VecDeque<Command>,
    out: W,
    view: View,
}

impl<W: Write + Send> TerminalDriver<W> {
    /// Create a driver reading `lines` and `events`, printing to `out`.
    pub fn new(lines: mpsc::UnboundedReceiver<String>, events: TransportEvents, out: W) -> Self {
        Self { lines, events, queued: VecDeque::new(), out, view: View::new() }
    }

    /// Run `command` before any typed input.
    pub fn queue(&mut self, command: Command) {
        self.queued.push_back(command);
    }

    /// The output writer.
    pub fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write + Send> Driver for TerminalDriver<W> {
    type Error = TerminalError;

    async fn next_input(&mut self) -> Result<Option<Input>, Self::Error> {
        if let Some(command) = self.queued.pop_front() {
            return Ok(Some(Input::Command(command)));
        }

        loop {
            tokio::select! {
                biased;

                Some(event) = self.events.recv() => return Ok(Some(Input::Transport(event))),

                line = self.lines.recv() => {
                    let Some(line) = line else {
                        tracing::debug!("input closed");
                        return Ok(None);
                    };
                    match Command::parse(&line) {
                        Ok(Some(command)) => return Ok(Some(Input::Command(command))),
                        Ok(None) => {},
                        Err(e) => {
                            writeln!(self.out, "! {e}")?;
                            self.out.flush()?;
                        },
                    }
                }
            }
        }
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        for line in self.view.update(app) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn stop(&mut self) {
        let _ = self.out.flush();
    }
}
