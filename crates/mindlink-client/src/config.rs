//! Client configuration.

use url::Url;

use crate::error::ConfigError;

/// Server used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000";

/// How the manager reports conditions the UI is expected to prevent.
///
/// `Lenient` matches the behavior UIs have relied on: malformed frames and
/// sends without an open connection are dropped with a debug log. `Strict`
/// reports them as [`crate::ClientError`]s instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Drop silently.
    #[default]
    Lenient,
    /// Surface `NotConnected` and decode errors.
    Strict,
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the environment server (`ws`, `wss`, `http` or `https`).
    pub base_url: Url,
    /// Error reporting mode.
    pub delivery: DeliveryMode,
}

impl ClientConfig {
    /// Parse a base URL.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidUrl` if the URL does not parse
    /// - `ConfigError::UnsupportedScheme` for schemes other than ws/wss/http/https
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        match base_url.scheme() {
            "ws" | "wss" | "http" | "https" => {},
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }

        Ok(Self { base_url, delivery: DeliveryMode::default() })
    }

    /// Set the delivery mode.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }
}
