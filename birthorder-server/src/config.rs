//! Server configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `HOST`: bind address (default: 0.0.0.0)
//! - `PORT`: listen port (default: 3000)
//! - `BIRTHORDER_BACKEND`: memory, sqlite or mongodb (default: memory)
//! - `DATABASE_URL`: SQLite connection string
//! - `MONGODB_URI`: MongoDB connection string
//! - `REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
//!
//! Unparseable values fall back to the default with a warning.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::store::{Backend, StoreConfig};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://submissions.db?mode=rwc";
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/birth-order-research";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub database_url: String,
    pub mongodb_uri: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            backend: Backend::Memory,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            mongodb_uri: DEFAULT_MONGODB_URI.to_string(),
            request_timeout_secs: 30,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment value");
            default
        }),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", defaults.host),
            port: env_or("PORT", defaults.port),
            backend: env_or("BIRTHORDER_BACKEND", defaults.backend),
            database_url: env_or("DATABASE_URL", defaults.database_url),
            mongodb_uri: env_or("MONGODB_URI", defaults.mongodb_uri),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            backend: self.backend,
            database_url: self.database_url.clone(),
            mongodb_uri: self.mongodb_uri.clone(),
        }
    }

    /// Resolved listen address; a bad host falls back to all interfaces.
    pub fn bind_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], self.port)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr().port(), 3000);
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn store_config_carries_connection_strings() {
        let config = ServerConfig {
            backend: Backend::Sqlite,
            database_url: "sqlite::memory:".into(),
            ..ServerConfig::default()
        };
        let store = config.store_config();
        assert_eq!(store.backend, Backend::Sqlite);
        assert_eq!(store.database_url, "sqlite::memory:");
        assert_eq!(store.mongodb_uri, DEFAULT_MONGODB_URI);
    }

    #[test]
    fn unparseable_host_falls_back() {
        let config = ServerConfig {
            host: "not a host".into(),
            port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(config.bind_addr(), SocketAddr::from(([0, 0, 0, 0], 8080)));
    }
}
