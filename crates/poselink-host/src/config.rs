use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Host connection and scheduling configuration.
///
/// Loaded from JSON by the embedding application, or built in code via
/// `Default` plus field updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Producer address, `host:port`.
    pub address: String,
    /// Initial device catalogue string, e.g. `"h c c"`.
    pub catalog: String,
    /// TCP connect timeout in milliseconds; 0 blocks indefinitely.
    pub connect_timeout_ms: u64,
    /// Fast scheduler cadence in microseconds (staged-catalogue polling).
    pub fast_tick_us: u64,
    /// Maintenance scheduler cadence in milliseconds.
    pub maintenance_tick_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:6969".to_string(),
            catalog: String::new(),
            connect_timeout_ms: 5_000,
            fast_tick_us: 500,
            maintenance_tick_ms: 1_000,
        }
    }
}

impl HostConfig {
    /// Parse a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The producer address as a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.address.parse()?)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    pub fn fast_tick(&self) -> Duration {
        Duration::from_micros(self.fast_tick_us.max(1))
    }

    pub fn maintenance_tick(&self) -> Duration {
        Duration::from_millis(self.maintenance_tick_ms.max(1))
    }
}
