//! Backend endpoint configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use owl_store::OwlConfig;
use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("OWL_BIND_ADDR is not a socket address: {0}")]
    InvalidBindAddr(String),
}

/// Where the client finds the backend and where the server listens.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend, without trailing slash.
    pub api_url: String,
    pub bind_addr: SocketAddr,
    /// Snapshot polling interval of [`crate::HttpBackend`].
    pub poll_interval: Duration,
}

impl BackendConfig {
    /// Read `OWL_API_URL` and `OWL_BIND_ADDR`, loading a `.env` file if present.
    pub fn from_env() -> Result<Self, EnvError> {
        dotenvy::dotenv().ok();

        let api_url = std::env::var("OWL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let bind_addr =
            std::env::var("OWL_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| EnvError::InvalidBindAddr(bind_addr))?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            bind_addr,
            poll_interval: OwlConfig::default().remote.poll_interval(),
        })
    }

    /// Take the polling interval from an `owl.toml` config.
    pub fn with_owl_config(mut self, config: &OwlConfig) -> Self {
        self.poll_interval = config.remote.poll_interval();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_interval_from_owl_config() {
        let config = BackendConfig {
            api_url: DEFAULT_API_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.parse().unwrap(),
            poll_interval: Duration::from_secs(5),
        }
        .with_owl_config(&OwlConfig::default().with_poll_interval(2));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
    }
}
