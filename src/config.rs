use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning of a connection.
///
/// Missing fields take their default values when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bound on TCP connect and SSH handshake, in seconds
    pub connect_timeout_secs: u64,
    /// Maximum response time of an SFTP request, in seconds
    pub request_timeout_secs: u64,
    /// Size of the chunks a download reads.
    /// Cancellation is observed between chunks, so this bounds its latency.
    pub read_chunk_size: usize,
    /// Interval of SSH keepalive messages, disabled when `None`
    pub keepalive_interval_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 10,
            read_chunk_size: 32 * 1024,
            keepalive_interval_secs: Some(30),
        }
    }
}

impl Config {
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn keepalive_interval(&self) -> Option<Duration> {
        self.keepalive_interval_secs.map(Duration::from_secs)
    }

    /// Chunk size actually used, never zero.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.read_chunk_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.chunk_size(), 32 * 1024);
        assert_eq!(config.keepalive_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        let config = Config {
            read_chunk_size: 0,
            ..Default::default()
        };
        assert_eq!(config.chunk_size(), 1);
    }
}
