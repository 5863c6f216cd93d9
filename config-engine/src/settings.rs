use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ConfigError, Result};

/// Which tuple store backs the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store, lost on exit
    #[default]
    Memory,
    Postgres,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Postgres => f.write_str("postgres"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
            acquire_timeout_secs: 30,
        }
    }
}

/// Top-level configuration of the authorization services
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    pub store: StoreConfig,
    pub logging: LoggerConfig,
}

impl AuthzConfig {
    /// Reject settings that cannot produce a working store
    pub fn validate(&self) -> Result<()> {
        if self.store.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "store.max_connections must be greater than zero".to_string(),
            ));
        }

        if self.store.backend == StoreBackend::Postgres {
            match self.store.database_url.as_deref() {
                Some(url) if !url.trim().is_empty() => {}
                _ => {
                    return Err(ConfigError::ValidationError(
                        "store.database_url is required for the postgres backend".to_string(),
                    ))
                }
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.level must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
