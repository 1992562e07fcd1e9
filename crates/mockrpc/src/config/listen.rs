use crate::error::SetupError;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Where and how the listener runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Fixed port. When unset an ephemeral port is picked on first start and
    /// reused on every later start of the same server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Worker threads of the serving runtime; tokio's default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Upper bound on waiting for open connections to finish during stop
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_drain_timeout_ms() -> u64 {
    5000
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            workers: None,
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl ListenConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Bind address. `localhost` is accepted as an alias for `127.0.0.1`;
    /// anything else must be an IP literal.
    pub fn ip(&self) -> Result<IpAddr, SetupError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(IpAddr::from([127, 0, 0, 1]));
        }
        self.host
            .parse()
            .map_err(|_| SetupError::Config(format!("listen.host '{}' is not an IP address", self.host)))
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        self.ip()?;
        if self.workers == Some(0) {
            return Err(SetupError::Config(
                "listen.workers must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
