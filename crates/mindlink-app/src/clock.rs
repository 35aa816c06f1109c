//! Wall-clock abstraction.
//!
//! The [`crate::App`] stamps locally originated chat entries. Reading time
//! through [`Clock`] lets simulation pin timestamps while production uses the
//! system clock.

use std::fmt;

/// Source of display timestamps.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Current time as an RFC 3339 string.
    fn now_timestamp(&self) -> String;
}

/// System wall clock (UTC).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_timestamp(&self) -> String {
        chrono::Utc::now().to_rfc3339()
    }
}
