//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ClientError;

/// Path of the play endpoint, relative to the base path.
const PLAY_PATH: &str = "games/play";

/// Where the game server lives and how the connection behaves.
///
/// Override individual fields with the builder methods:
///
/// ```rust
/// use dropfour::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_host("play.example.com")
///     .with_secure(true);
///
/// let url = config.endpoint("abc").unwrap();
/// assert_eq!(url.as_str(), "wss://play.example.com/api/v1/games/play?token=abc");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host and optional port, e.g. `localhost:8080`.
    pub host: String,

    /// Prefix for every API path, e.g. `/api/v1`.
    pub base_path: String,

    /// Dial `wss://` instead of `ws://`. Needs the `tls` feature.
    pub secure: bool,

    /// WebSocket subprotocol to request in the handshake
    /// (`Sec-WebSocket-Protocol`), e.g. `json.v1`. The connection fails
    /// unless the server selects it.
    pub subprotocol: Option<String>,

    /// How long [`close`](crate::ConnectionManager::close) waits for the
    /// close handshake before abandoning the socket.
    pub close_timeout: Duration,

    /// Capacity of each [`subscribe`](crate::GameClient::subscribe)
    /// receiver. A subscriber that falls further behind than this misses
    /// the oldest events.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8080".to_string(),
            base_path: "/api/v1".to_string(),
            secure: false,
            subprotocol: None,
            close_timeout: Duration::from_secs(1),
            event_capacity: 64,
        }
    }
}

impl ClientConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = Some(subprotocol.into());
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// The play endpoint with `token` as its credential:
    /// `{ws|wss}://{host}{base_path}/games/play?token={token}`.
    ///
    /// The token is percent-encoded into the query string.
    ///
    /// # Errors
    /// [`ClientError::InvalidEndpoint`] if `host` is not a valid host.
    pub fn endpoint(&self, token: &str) -> Result<Url, ClientError> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let mut url = Url::parse(&format!("{scheme}://{}", self.host))?;

        let base = self.base_path.trim_matches('/');
        if base.is_empty() {
            url.set_path(PLAY_PATH);
        } else {
            url.set_path(&format!("{base}/{PLAY_PATH}"));
        }
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}
