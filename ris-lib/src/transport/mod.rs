//! HTTP transport shared by the RIS and auth endpoints.
//!
//! A single [`ConnectionPool`] handle is cloned into every client. It bounds
//! concurrent requests overall and per route (scheme, host and port) and
//! applies connect and read timeouts to every POST.

mod pool;

use serde::{Deserialize, Serialize};

pub use pool::{ConnectionPool, HttpReply};

/// Connection pool and timeout settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Read timeout in milliseconds, covering the whole response.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Maximum concurrent requests across all routes.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Maximum concurrent requests per route.
    #[serde(default = "default_max_connections")]
    pub max_connections_per_route: usize,

    /// How long an idle connection is kept, in milliseconds.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_read_timeout_ms() -> u64 {
    10_000
}

fn default_max_connections() -> usize {
    256
}

fn default_idle_timeout_ms() -> u64 {
    60_000
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            max_connections: default_max_connections(),
            max_connections_per_route: default_max_connections(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl PoolConfig {
    /// Set the connect timeout.
    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout_ms = ms;
        self
    }

    /// Set the total connection limit.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the per-route connection limit.
    pub fn with_max_connections_per_route(mut self, max: usize) -> Self {
        self.max_connections_per_route = max;
        self
    }

    /// Set the idle connection TTL.
    pub fn with_idle_timeout_ms(mut self, ms: u64) -> Self {
        self.idle_timeout_ms = ms;
        self
    }
}
