//! Mindlink CLI entry point.
//!
//! # Usage
//!
//! ```bash
//! # Start idle and type `/join <room> <gmid> <name>`
//! mindlink-cli --server ws://localhost:8000
//!
//! # Join on startup
//! mindlink-cli --server https://minds.example --room R1 --gmid GMID-1 --name Nova
//! ```

use clap::Parser;
use mindlink_app::{Command, EchoPolicy};
use mindlink_cli::{Settings, run};
use mindlink_client::{DEFAULT_SERVER_URL, DeliveryMode};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Mindlink terminal client
#[derive(Parser, Debug)]
#[command(name = "mindlink-cli")]
#[command(about = "Terminal client for Mindlink real-time environments")]
#[command(version)]
struct Args {
    /// Environment server base URL (ws, wss, http or https)
    #[arg(short, long, env = "MINDLINK_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Environment to join on startup
    #[arg(long, env = "MINDLINK_ROOM", requires = "gmid", requires = "name")]
    room: Option<String>,

    /// Participant id used when joining on startup
    #[arg(long, env = "MINDLINK_GMID")]
    gmid: Option<String>,

    /// Display name used when joining on startup
    #[arg(long, env = "MINDLINK_NAME")]
    name: Option<String>,

    /// Report malformed frames and sends without a connection as errors
    #[arg(long)]
    strict: bool,

    /// Hide the server's broadcast of your own chat messages
    #[arg(long)]
    suppress_echo: bool,

    /// Log level (trace, debug, info, warn, error) when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn into_settings(self) -> Settings {
        let join = match (self.room, self.gmid, self.name) {
            (Some(room_id), Some(gmid), Some(mind_name)) => {
                Some(Command::Join { room_id, gmid, mind_name })
            },
            _ => None,
        };

        Settings {
            server: self.server,
            join,
            delivery: if self.strict { DeliveryMode::Strict } else { DeliveryMode::Lenient },
            echo_policy: if self.suppress_echo {
                EchoPolicy::SuppressOwnEcho
            } else {
                EchoPolicy::Keep
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Stdout carries the transcript.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let result = runtime.block_on(run(args.into_settings()));
    // A pending stdin read cannot be cancelled, so do not wait for it.
    runtime.shutdown_background();
    Ok(result?)
}
