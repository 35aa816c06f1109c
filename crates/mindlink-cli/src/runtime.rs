//! Async runtime
//!
//! Wires a [`WsTransport`] and a [`TerminalDriver`] into the shared
//! [`mindlink_app::Runtime`] and runs it until `/quit` or end of input.

use std::io;

use mindlink_app::{App, Bridge, Command, EchoPolicy};
use mindlink_client::{ClientConfig, ConfigError, DeliveryMode, ws::WsTransport};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc,
};

use crate::terminal::{TerminalDriver, TerminalError};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Server URL rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Terminal I/O failed.
    #[error(transparent)]
    Terminal(#[from] TerminalError),
}

/// Session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Environment server base URL.
    pub server: String,
    /// Join to run before reading input.
    pub join: Option<Command>,
    /// Error reporting mode.
    pub delivery: DeliveryMode,
    /// Own-broadcast handling.
    pub echo_policy: EchoPolicy,
}

/// Run a terminal session against the configured server.
///
/// # Errors
///
/// - `RuntimeError::Config` if the server URL is not a usable base URL
/// - `RuntimeError::Terminal` if writing to stdout fails
pub async fn run(settings: Settings) -> Result<(), RuntimeError> {
    let config = ClientConfig::new(&settings.server)?.with_delivery(settings.delivery);
    tracing::info!(server = %config.base_url, delivery = ?config.delivery, "starting session");

    let (transport, events) = WsTransport::new();
    let mut driver = TerminalDriver::new(spawn_line_reader(tokio::io::stdin()), events, io::stdout());
    if let Some(join) = settings.join {
        driver.queue(join);
    }

    let app = App::new().with_echo_policy(settings.echo_policy);
    let mut runtime = mindlink_app::Runtime::new(driver, app, Bridge::new(transport, config));
    runtime.run().await?;
    Ok(())
}

/// Forward lines of `input` to a channel from a background task.
///
/// The channel closes at end of input or on a read error.
fn spawn_line_reader<R>(input: R) -> mpsc::UnboundedReceiver<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(input).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "input read failed");
                    break;
                },
            }
        }
    });
    rx
}
