//! Application layer for Mindlink
//!
//! Pure state machines and a generic runtime for UI and connection
//! orchestration, so simulation tests exercise the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: presence and message reducer (session status, log, presence)
//! - [`Bridge`]: drives a [`mindlink_client::ConnectionManager`] from App
//!   actions and turns its callbacks back into App events
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: generic orchestration loop using a Driver
//! - [`Command`]: line commands understood by frontends

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod clock;
mod driver;
mod event;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::{App, AppError};
pub use bridge::Bridge;
pub use clock::{Clock, SystemClock};
pub use driver::{Driver, Input};
pub use event::AppEvent;
pub use input::{Command, CommandError};
pub use runtime::Runtime;
pub use state::{ChatOrigin, EchoPolicy, LogEntry, SessionStatus};
