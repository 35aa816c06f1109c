//! Deterministic clock.

use std::sync::atomic::{AtomicI64, Ordering};

use mindlink_app::Clock;

/// Clock that advances one second per reading, starting at a fixed instant.
#[derive(Debug)]
pub struct SimClock {
    next: AtomicI64,
}

impl SimClock {
    /// Start at 2025-01-01T12:00:00Z.
    pub fn new() -> Self {
        Self::starting_at(1_735_732_800)
    }

    /// Start at the given Unix timestamp.
    pub fn starting_at(unix_secs: i64) -> Self {
        Self { next: AtomicI64::new(unix_secs) }
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now_timestamp(&self) -> String {
        let secs = self.next.fetch_add(1, Ordering::Relaxed);
        chrono::DateTime::from_timestamp(secs, 0).map(|t| t.to_rfc3339()).unwrap_or_default()
    }
}
