use crate::config::ReconnectPolicy;
use crate::error::TransportError;
use periscope_core::IceServerConfig;
use periscope_core::utils::{
    DEFAULT_SIGNALING_ENDPOINT, DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2, DEFAULT_STUN_ADDR_3,
    DEFAULT_STUN_ADDR_4,
};
use std::time::Duration;
use url::Url;

/// Environment variable consulted by [`ViewerConfig::from_env`].
pub const ENDPOINT_ENV: &str = "PERISCOPE_WS_URL";

/// Settings for one viewer session.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Signaling endpoint; `http(s)://` is accepted and mapped to `ws(s)://`.
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    /// STUN/TURN servers for the peer connection. Empty means host candidates only.
    pub ice_servers: Vec<IceServerConfig>,
    /// Upper bound from sending a join to receiving media. `None` waits forever.
    pub negotiation_timeout: Option<Duration>,
    /// Re-issue the join for the lost stream once the transport reconnects.
    pub rejoin_on_reconnect: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SIGNALING_ENDPOINT.to_owned(),
            connect_timeout: Duration::from_secs(10),
            reconnect: ReconnectPolicy::default(),
            ice_servers: vec![IceServerConfig::stun([
                DEFAULT_STUN_ADDR,
                DEFAULT_STUN_ADDR_2,
                DEFAULT_STUN_ADDR_3,
                DEFAULT_STUN_ADDR_4,
            ])],
            negotiation_timeout: Some(Duration::from_secs(30)),
            rejoin_on_reconnect: false,
        }
    }
}

impl ViewerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Defaults, with the endpoint taken from `PERISCOPE_WS_URL` when set.
    pub fn from_env() -> Self {
        match std::env::var(ENDPOINT_ENV) {
            Ok(endpoint) if !endpoint.trim().is_empty() => Self::new(endpoint.trim()),
            _ => Self::default(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn with_ice_servers(mut self, servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = servers;
        self
    }

    pub fn with_negotiation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.negotiation_timeout = timeout;
        self
    }

    pub fn with_rejoin_on_reconnect(mut self, rejoin: bool) -> Self {
        self.rejoin_on_reconnect = rejoin;
        self
    }

    /// Resolves the configured endpoint to the WebSocket URL actually dialed.
    pub fn websocket_url(&self) -> Result<Url, TransportError> {
        let invalid = || TransportError::InvalidEndpoint(self.endpoint.clone());

        let mut url = Url::parse(self.endpoint.trim()).map_err(|_| invalid())?;
        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            _ => return Err(invalid()),
        };
        if url.host_str().is_none() {
            return Err(invalid());
        }
        url.set_scheme(scheme).map_err(|_| invalid())?;
        Ok(url)
    }
}
