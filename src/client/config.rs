//! Client configuration options.

use std::time::Duration;

use url::Url;

/// Configuration for the API client.
///
/// # Example
///
/// ```
/// use saxo_rs::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("my-app/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
    /// Override the gateway base URL derived from the session's environment
    pub api_base: Option<Url>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("saxo-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
            api_base: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Route requests to a specific gateway base URL.
    ///
    /// Intended for tests and proxies; the environment default is used
    /// otherwise.
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = Some(api_base);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("saxo-rs/"));
        assert!(config.api_base.is_none());
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("custom/2.0")
            .with_api_base(Url::parse("http://127.0.0.1:8080/openapi").unwrap());

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "custom/2.0");
        assert_eq!(
            config.api_base.unwrap().as_str(),
            "http://127.0.0.1:8080/openapi"
        );
    }
}
