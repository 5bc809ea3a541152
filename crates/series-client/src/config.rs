//! client config

use std::time::Duration;

/// Connect timeout used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);
/// Socket (read) timeout used when none is configured.
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_millis(2000);

/// Series client config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// collector endpoint the series is POSTed to
    pub url: String,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// per-request read timeout
    pub socket_timeout: Duration,
    /// idle connections kept per host
    pub max_connections: usize,
}

impl ClientConfig {
    /// create new client config with default parameters.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            max_connections: 1,
        }
    }

    /// set connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// set socket timeout.
    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// set the idle connection limit.
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }
}
