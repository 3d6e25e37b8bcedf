//! Environment-driven store configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use strum_macros::{AsRefStr, Display, EnumString};

use crate::json_log::JsonLogBackend;
use crate::memory::MemoryBackend;
use crate::sqlite::SqliteBackend;
use crate::{DEFAULT_TIMEOUT, ReportStore, StoreBackend, StoreError};

/// Errors from reading configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to something that does not parse.
    #[error("Invalid value {value:?} for {name}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// The offending value.
        value: String,
    },
}

/// Which storage engine backs the report store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackendKind {
    /// Flat JSON record log.
    #[default]
    Json,
    /// `SQLite` document table.
    Sqlite,
    /// In-process only.
    Memory,
}

impl BackendKind {
    /// Default data path for this backend. Empty for [`BackendKind::Memory`].
    #[must_use]
    pub fn default_path(self) -> PathBuf {
        match self {
            Self::Json => PathBuf::from(crate::json_log::DEFAULT_PATH),
            Self::Sqlite => PathBuf::from(crate::sqlite::DEFAULT_PATH),
            Self::Memory => PathBuf::new(),
        }
    }
}

/// How to build a [`ReportStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Storage engine.
    pub backend: BackendKind,
    /// File backing the store (ignored for memory).
    pub path: PathBuf,
    /// Bound on each store operation.
    pub timeout: Duration,
}

impl StoreConfig {
    /// Configuration for `backend` at its default path and timeout.
    #[must_use]
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            path: backend.default_path(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `PARKING_STORE`, `PARKING_DATA_PATH`, and
    /// `PARKING_STORE_TIMEOUT_SECS`, falling back to defaults for unset
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = parse_env_var::<BackendKind>("PARKING_STORE")?.unwrap_or_default();
        let mut config = Self::new(backend);

        if let Some(path) = std::env::var_os("PARKING_DATA_PATH") {
            config.path = PathBuf::from(path);
        }

        if let Some(secs) = parse_env_var::<u64>("PARKING_STORE_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "PARKING_STORE_TIMEOUT_SECS",
                    value: secs.to_string(),
                });
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Opens the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be opened.
    pub async fn open(&self) -> Result<ReportStore, StoreError> {
        let backend: Arc<dyn StoreBackend> = match self.backend {
            BackendKind::Json => Arc::new(JsonLogBackend::new(&self.path)),
            BackendKind::Sqlite => Arc::new(SqliteBackend::open(&self.path).await?),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };

        log::info!(
            "Using {} report store at {}",
            self.backend,
            self.path.display()
        );

        Ok(ReportStore::new(backend).with_timeout(self.timeout))
    }
}

/// Reads and parses an environment variable.
///
/// Returns `Ok(None)` when the variable is unset or blank.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the value does not parse as `T`.
pub fn parse_env_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => parse_value(name, &value).map(Some),
        _ => Ok(None),
    }
}

/// Parses a configuration value, naming the variable on failure.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the value does not parse as `T`.
pub fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_case_insensitively() {
        assert_eq!("json".parse::<BackendKind>().unwrap(), BackendKind::Json);
        assert_eq!("SQLite".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert!("mongo".parse::<BackendKind>().is_err());
    }

    #[test]
    fn defaults_follow_backend() {
        let config = StoreConfig::new(BackendKind::Sqlite);
        assert_eq!(config.path, PathBuf::from("data/parking.db"));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);

        let config = StoreConfig::new(BackendKind::default());
        assert_eq!(config.path, PathBuf::from("data/available_parking.json"));
    }

    #[test]
    fn parse_value_names_the_variable() {
        let err = parse_value::<u64>("PARKING_STORE_TIMEOUT_SECS", "soon").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value \"soon\" for PARKING_STORE_TIMEOUT_SECS"
        );
        assert_eq!(parse_value::<u64>("X", " 15 ").unwrap(), 15);
    }

    #[tokio::test]
    async fn memory_config_opens_an_empty_store() {
        let store = StoreConfig::new(BackendKind::Memory).open().await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert!(store.scan_active().await.unwrap().is_empty());
    }
}
