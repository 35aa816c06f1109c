//! Wire protocol for Mindlink environments.
//!
//! An environment is a server-managed room where minds chat and share objects.
//! Every frame is a JSON text message whose `type` field selects the variant.
//!
//! # Components
//!
//! - [`InboundMessage`]: events pushed by the server
//! - [`OutboundMessage`]: requests sent by the client
//! - [`ProtocolError`]: encode/decode failures

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod inbound;
pub mod outbound;

pub use errors::{ProtocolError, Result};
pub use inbound::{EnvironmentSnapshot, InboundMessage};
pub use outbound::OutboundMessage;
