//! Configuration for the sync engine.

use std::time::Duration;

/// Default period of the local-preferred background sync.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default per-request timeout handed to the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the remote store.
    pub base_url: String,
    /// Period of the background sync while signed in.
    pub sync_interval: Duration,
    /// How often the background driver checks whether a sync is due.
    pub poll_interval: Duration,
    /// Request timeout handed to the HTTP client. The engine itself never
    /// times out an attempt.
    pub request_timeout: Duration,
    /// Bearer token sent with every request.
    pub auth_token: Option<String>,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            sync_interval: DEFAULT_SYNC_INTERVAL,
            poll_interval: Duration::from_secs(1),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            auth_token: None,
        }
    }

    /// Sets the background sync period.
    #[must_use]
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Sets the background driver's polling period.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the auth token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.sync_interval, Duration::from_secs(300));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn builder() {
        let config = SyncConfig::new("https://cards.example.com")
            .with_sync_interval(Duration::from_secs(60))
            .with_request_timeout(Duration::from_secs(5))
            .with_auth_token("tok");

        assert_eq!(config.base_url, "https://cards.example.com");
        assert_eq!(config.sync_interval, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.auth_token.as_deref(), Some("tok"));
    }
}
