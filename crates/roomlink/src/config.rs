//! Lobby configuration: defaults, builder, environment overrides.

use std::time::Duration;

use roomlink_tick::PollConfig;
use roomlink_transport::HttpConfig;
use tracing::warn;

/// Default room API root.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/api";

/// Default interval between lobby polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default cap on rooms returned by the directory.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page the directory will return.
pub const MAX_PAGE_SIZE: usize = 100;

/// Everything a [`Lobby`](crate::Lobby) needs to know about its
/// environment.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Room API root; `/rooms` is appended.
    pub base_url: String,
    /// Bearer token identifying this client to the room API.
    pub auth_token: Option<String>,
    /// Whole-request timeout for every API call.
    pub request_timeout: Duration,
    /// Interval of the reconciliation loop while the lobby is visible.
    /// Zero disables interval polling (mutations and refresh only).
    pub poll_interval: Duration,
    /// Maximum number of rooms the directory returns.
    pub page_size: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(10),
            poll_interval: DEFAULT_POLL_INTERVAL,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl LobbyConfig {
    /// Starts a builder from the defaults.
    pub fn builder() -> LobbyConfigBuilder {
        LobbyConfigBuilder::new()
    }

    /// Create config from environment variables.
    ///
    /// Environment variables:
    /// - `ROOMLINK_BASE_URL` - Room API root (default: `http://127.0.0.1:3000/api`)
    /// - `ROOMLINK_AUTH_TOKEN` - Bearer token (default: none)
    /// - `ROOMLINK_POLL_INTERVAL_MS` - Poll interval, 0 = manual (default: 3000)
    /// - `ROOMLINK_PAGE_SIZE` - Directory page size (default: 20)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let base_url = lookup("ROOMLINK_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let auth_token =
            lookup("ROOMLINK_AUTH_TOKEN").filter(|s| !s.trim().is_empty());

        let poll_interval = lookup("ROOMLINK_POLL_INTERVAL_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let page_size = lookup("ROOMLINK_PAGE_SIZE")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.page_size);

        Self {
            base_url,
            auth_token,
            poll_interval,
            page_size,
            ..defaults
        }
        .validated()
    }

    /// Clamp out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            let clamped = self.page_size.clamp(1, MAX_PAGE_SIZE);
            warn!(
                page_size = self.page_size,
                clamped, "page size out of range, clamping"
            );
            self.page_size = clamped;
        }
        if self.request_timeout.is_zero() {
            self.request_timeout = Self::default().request_timeout;
        }
        self
    }

    /// Settings for [`HttpRoomService`](roomlink_transport::HttpRoomService).
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            base_url: self.base_url.clone(),
            auth_token: self.auth_token.clone(),
            request_timeout: self.request_timeout,
            ..HttpConfig::default()
        }
    }

    /// Settings for the lobby's poll scheduler.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig::with_interval(self.poll_interval)
    }
}

/// Builder for [`LobbyConfig`].
///
/// ```
/// use std::time::Duration;
/// use roomlink::LobbyConfig;
///
/// let config = LobbyConfig::builder()
///     .base_url("https://games.example.com/api")
///     .auth_token("secret")
///     .poll_interval(Duration::from_secs(5))
///     .build();
/// assert_eq!(config.page_size, 20);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LobbyConfigBuilder {
    config: LobbyConfig,
}

impl LobbyConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the room API root.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Sets the bearer token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth_token = Some(token.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets the poll interval. Zero means manual polling.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Sets the directory page size.
    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    /// Finishes the config, clamping out-of-range values.
    pub fn build(self) -> LobbyConfig {
        self.config.validated()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LobbyConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert_eq!(config.page_size, 20);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_from_lookup_with_valid_values() {
        let config = LobbyConfig::from_lookup(lookup(&[
            ("ROOMLINK_BASE_URL", "https://games.example.com/api"),
            ("ROOMLINK_AUTH_TOKEN", "t0ken"),
            ("ROOMLINK_POLL_INTERVAL_MS", "1500"),
            ("ROOMLINK_PAGE_SIZE", "5"),
        ]));
        assert_eq!(config.base_url, "https://games.example.com/api");
        assert_eq!(config.auth_token.as_deref(), Some("t0ken"));
        assert_eq!(config.poll_interval, Duration::from_millis(1500));
        assert_eq!(config.page_size, 5);
    }

    #[test]
    fn test_from_lookup_with_invalid_values_uses_defaults() {
        let config = LobbyConfig::from_lookup(lookup(&[
            ("ROOMLINK_BASE_URL", "  "),
            ("ROOMLINK_AUTH_TOKEN", ""),
            ("ROOMLINK_POLL_INTERVAL_MS", "soon"),
            ("ROOMLINK_PAGE_SIZE", "-3"),
        ]));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.auth_token.is_none());
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_from_lookup_with_missing_vars_uses_defaults() {
        let config = LobbyConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_validated_clamps_page_size() {
        assert_eq!(LobbyConfig::builder().page_size(0).build().page_size, 1);
        assert_eq!(
            LobbyConfig::builder().page_size(10_000).build().page_size,
            MAX_PAGE_SIZE
        );
    }

    #[test]
    fn test_zero_poll_interval_is_manual() {
        let config = LobbyConfig::builder()
            .poll_interval(Duration::ZERO)
            .build();
        assert!(config.poll_config().is_manual());
    }

    #[test]
    fn test_http_config_carries_token_and_timeout() {
        let config = LobbyConfig::builder()
            .auth_token("abc")
            .request_timeout(Duration::from_secs(2))
            .build();
        let http = config.http_config();
        assert_eq!(http.auth_token.as_deref(), Some("abc"));
        assert_eq!(http.request_timeout, Duration::from_secs(2));
        assert_eq!(http.base_url, DEFAULT_BASE_URL);
    }
}
