//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use mindlink_client::TransportEvent;

use crate::{App, Command};

/// One unit of work for the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// User command.
    Command(Command),
    /// Outcome reported by the transport.
    Transport(TransportEvent),
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal client and simulation.
///
/// # Implementations
///
/// - **CLI**: stdin lines and a WebSocket transport's event channel
/// - **Simulation**: scripted inputs with recorded renders
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input.
    ///
    /// Returns `None` when input is exhausted and the runtime should stop.
    fn next_input(&mut self) -> impl Future<Output = Result<Option<Input>, Self::Error>> + Send;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Release resources. Called once when the runtime exits.
    fn stop(&mut self);
}
