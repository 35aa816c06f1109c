//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: presence and message state machine
//! - [`Bridge`]: connection manager adapter
//! - [`Driver`]: platform-specific I/O

use mindlink_client::Transport;

use crate::{App, AppAction, AppEvent, Bridge, Driver, Input};

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `T`: Transport used by the bridge's connection manager
pub struct Runtime<D, T>
where
    D: Driver,
    T: Transport,
{
    driver: D,
    app: App,
    bridge: Bridge<T>,
}

impl<D, T> Runtime<D, T>
where
    D: Driver,
    T: Transport,
{
    /// Create a runtime from its parts.
    pub fn new(driver: D, app: App, bridge: Bridge<T>) -> Self {
        Self { driver, app, bridge }
    }

    /// Run the main event loop.
    ///
    /// Processes inputs one at a time until the App asks to quit or the driver
    /// runs out of input, then closes any open connection and stops the
    /// driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;

        let result = self.event_loop().await;

        self.bridge.shutdown();
        self.driver.stop();
        result
    }

    async fn event_loop(&mut self) -> Result<(), D::Error> {
        while let Some(input) = self.driver.next_input().await? {
            if self.step(input)? {
                tracing::debug!("quit requested");
                break;
            }
        }
        Ok(())
    }

    /// Process a single input.
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn step(&mut self, input: Input) -> Result<bool, D::Error> {
        match input {
            Input::Command(command) => {
                let actions = self.app.execute(command);
                self.process_actions(actions)
            },
            Input::Transport(event) => {
                let events = self.bridge.handle_transport_event(event);
                self.process_events(events)
            },
        }
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),

                    // Connection operations go through the bridge
                    AppAction::Connect { .. }
                    | AppAction::Disconnect
                    | AppAction::SendChat { .. }
                    | AppAction::UpdateObject { .. } => {
                        let events = self.bridge.process_app_action(action);
                        for event in events {
                            pending_actions.extend(self.app.handle(event));
                        }
                    },
                }
            }
        }
        Ok(false)
    }

    /// Process events from Bridge back to App.
    fn process_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Get a reference to the Bridge
    pub fn bridge(&self) -> &Bridge<T> {
        &self.bridge
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
