//! Client connection settings.

use std::time::Duration;

/// Where to connect and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL of the server, e.g. `ws://127.0.0.1:12345`.
    pub url: String,
    /// Deadline for opening the connection.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub const DEFAULT_URL: &'static str = "ws://127.0.0.1:12345";
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default settings pointed at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: Self::DEFAULT_URL.to_string(),
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.url, "ws://127.0.0.1:12345");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_new_keeps_default_timeout() {
        let config = ClientConfig::new("ws://example.test:9000")
            .connect_timeout(Duration::from_millis(250));
        assert_eq!(config.url, "ws://example.test:9000");
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }
}
