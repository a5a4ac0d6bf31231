//! Configuration types for the BugRelay client.

use std::time::Duration;
use url::Url;

/// Fixed identifying user agent sent with every backend request.
pub const USER_AGENT: &str = "BugRelay-MCP-Server/1.0";

/// Default backend location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Configuration for the BugRelay client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the BugRelay API.
    pub base_url: Url,
    /// Static API key, sent as `X-API-Key` when no bearer token applies.
    pub api_key: Option<String>,
    /// Bearer token the session starts with.
    pub default_bearer_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Declared retry budget. The forwarder makes exactly one attempt per call;
    /// this is carried for callers layering their own retry policy.
    pub max_retries: u32,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            default_bearer_token: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_new() {
        let url = Url::parse("https://bugs.example.com").unwrap();
        let config = ClientConfig::new(url.clone());

        assert_eq!(config.base_url, url);
        assert!(config.api_key.is_none());
        assert!(config.default_bearer_token.is_none());
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new(Url::parse(DEFAULT_BASE_URL).unwrap());

        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }
}
