//! Environment endpoint derivation.
//!
//! The socket URL is a pure function of the server base URL and the
//! membership triple, so two clients with the same inputs always dial the same
//! endpoint.

use url::Url;

use crate::error::ConfigError;

/// One mind's membership in one environment.
///
/// All fields are trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Membership {
    room_id: String,
    gmid: String,
    mind_name: String,
}

impl Membership {
    /// Validate and create a membership.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingField` if any field is blank
    pub fn new(
        room_id: impl AsRef<str>,
        gmid: impl AsRef<str>,
        mind_name: impl AsRef<str>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            room_id: required(room_id.as_ref(), "environment id")?,
            gmid: required(gmid.as_ref(), "mind id")?,
            mind_name: required(mind_name.as_ref(), "mind name")?,
        })
    }

    /// Environment (room) identifier.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Participant identifier (GMID).
    pub fn gmid(&self) -> &str {
        &self.gmid
    }

    /// Participant display name.
    pub fn mind_name(&self) -> &str {
        &self.mind_name
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() { Err(ConfigError::MissingField(field)) } else { Ok(value.to_string()) }
}

/// Socket URL for a membership.
///
/// Produces `{base}/environments/{room_id}/ws?gmid={gmid}&mind_name={name}`.
/// `http`/`https` bases map to `ws`/`wss`; path segments and query values are
/// percent-encoded.
///
/// # Errors
///
/// - `ConfigError::UnsupportedScheme` if the base cannot carry a WebSocket
/// - `ConfigError::InvalidUrl` if the base cannot have path segments
pub fn environment_url(base: &Url, membership: &Membership) -> Result<Url, ConfigError> {
    let scheme = match base.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    };

    let mut url = base.clone();
    url.set_scheme(scheme).map_err(|()| ConfigError::UnsupportedScheme(scheme.to_string()))?;
    url.set_fragment(None);

    url.path_segments_mut()
        .map_err(|()| ConfigError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(["environments", membership.room_id(), "ws"]);

    url.query_pairs_mut()
        .clear()
        .append_pair("gmid", membership.gmid())
        .append_pair("mind_name", membership.mind_name());

    Ok(url)
}
