//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` is the terminal driver's counterpart for deterministic testing.
//! It implements [`Driver`] so the same [`mindlink_app::Runtime`]
//! orchestration code runs in both production and simulation. Inputs come from
//! the endpoint's [`SimNetwork`] queue first and a command script second;
//! every render is recorded.

use std::collections::VecDeque;

use mindlink_app::{App, Command, Driver, Input};

use crate::{invariants::RenderRecord, sim_network::SimNetwork};

/// Error type for simulation driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Simulation driver for deterministic testing.
#[derive(Debug)]
pub struct SimDriver {
    network: SimNetwork,
    endpoint: u64,
    script: VecDeque<Command>,
    renders: Vec<RenderRecord>,
    stopped: bool,
}

impl SimDriver {
    /// Create a driver reading events for `endpoint` from `network`.
    pub fn new(network: SimNetwork, endpoint: u64) -> Self {
        Self { network, endpoint, script: VecDeque::new(), renders: Vec::new(), stopped: false }
    }

    /// Queue commands to be returned after pending network events.
    #[must_use]
    pub fn with_script(mut self, commands: impl IntoIterator<Item = Command>) -> Self {
        self.script.extend(commands);
        self
    }

    /// Next input without waiting. Network events take priority.
    pub fn poll_input(&mut self) -> Option<Input> {
        if self.stopped {
            return None;
        }
        if let Some(event) = self.network.pop_event(self.endpoint) {
            return Some(Input::Transport(event));
        }
        self.script.pop_front().map(Input::Command)
    }

    /// Next network event for this endpoint, ignoring the script.
    pub fn poll_transport(&mut self) -> Option<Input> {
        self.network.pop_event(self.endpoint).map(Input::Transport)
    }

    /// Every render so far, oldest first.
    pub fn renders(&self) -> &[RenderRecord] {
        &self.renders
    }

    /// True once the runtime has stopped the driver.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn next_input(&mut self) -> Result<Option<Input>, Self::Error> {
        Ok(self.poll_input())
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        if self.stopped {
            return Err(SimDriverError("render after stop".into()));
        }
        self.renders.push(RenderRecord::capture(app));
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use mindlink_client::{ConnectionId, Transport, TransportEvent};
    use url::Url;

    use super::*;

    #[test]
    fn network_events_come_before_script() {
        let network = SimNetwork::new();
        let mut transport = network.transport();
        let connection = ConnectionId::next();
        let url = Url::parse("ws://sim/environments/R1/ws?gmid=G&mind_name=Nova").unwrap();
        transport.open(connection, &url).unwrap();
        let mut driver =
            SimDriver::new(network, transport.endpoint()).with_script([Command::Leave]);

        assert_eq!(driver.poll_input(), Some(Input::Transport(TransportEvent::Opened { connection })));
        assert!(matches!(driver.poll_input(), Some(Input::Transport(TransportEvent::Text { .. }))));
        assert_eq!(driver.poll_input(), Some(Input::Command(Command::Leave)));
        assert_eq!(driver.poll_input(), None);
    }

    #[test]
    fn render_records_app_state() {
        let mut driver = SimDriver::new(SimNetwork::new(), 1);
        let app = App::new();

        driver.render(&app).unwrap();

        assert_eq!(driver.renders(), [RenderRecord::capture(&app)]);
    }

    #[test]
    fn stopped_driver_yields_nothing() {
        let mut driver = SimDriver::new(SimNetwork::new(), 1).with_script([Command::Quit]);
        driver.stop();

        assert!(driver.is_stopped());
        assert_eq!(driver.poll_input(), None);
        assert!(driver.render(&App::new()).is_err());
    }

    #[tokio::test]
    async fn next_input_drains_script() {
        let mut driver = SimDriver::new(SimNetwork::new(), 1).with_script([Command::Quit]);

        assert_eq!(driver.next_input().await.unwrap(), Some(Input::Command(Command::Quit)));
        assert_eq!(driver.next_input().await.unwrap(), None);
    }
}
