//! Server configuration read from the environment.

use parking_index::IndexConfig;
use parking_store::config::parse_env_var;
use parking_store::{ConfigError, StoreConfig};

/// Everything needed to start the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Interface to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// TCP port (`PORT`).
    pub port: u16,
    /// Report store settings.
    pub store: StoreConfig,
    /// Ranking settings.
    pub index: IndexConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            store: StoreConfig::new(parking_store::BackendKind::default()),
            index: IndexConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR` and `PORT` plus the store and index variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_env_var("PORT")?.unwrap_or(defaults.port),
            store: StoreConfig::from_env()?,
            index: IndexConfig::from_env()?,
        })
    }
}
