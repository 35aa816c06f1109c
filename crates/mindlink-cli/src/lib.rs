//! Mindlink CLI
//!
//! Line-oriented terminal client for Mindlink environments. Lines typed on
//! stdin become [`mindlink_app::Command`]s; the session is rendered as an
//! append-only transcript on stdout.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod runtime;
pub mod terminal;
pub mod view;

pub use runtime::{RuntimeError, Settings, run};
pub use terminal::{TerminalDriver, TerminalError};
pub use view::View;
