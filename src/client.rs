use reqwest::blocking::{Client, ClientBuilder};
use std::time::Duration;

use crate::error::Result;

/// Create the HTTP client for search API requests
/// with connection pooling and the configured timeouts
pub fn create_http_client(config: &Config) -> Result<Client> {
    let client = ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()?;
    Ok(client)
}

/// Configuration for the search API client
#[derive(Clone)]
pub struct Config {
    /// Service base URL, e.g. `http://localhost:7700`
    pub host: String,
    /// API key sent as bearer credential and used to sign tenant tokens
    pub api_key: Option<String>,
    /// Whole-request timeout
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "http://localhost:7700".to_string(),
            api_key: None,
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Create a new configuration for the given host
    pub fn new(host: impl Into<String>) -> Self {
        Config {
            host: host.into(),
            ..Config::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }
}

// Implement Debug manually to avoid exposing the API key
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
