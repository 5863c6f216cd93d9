use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::settings::AuthzConfig;

/// Default prefix for environment overrides, e.g. `AUTHZ_STORE__BACKEND`
pub const ENV_PREFIX: &str = "AUTHZ_";

/// Layered configuration loader.
///
/// Sources are merged lowest to highest precedence: built-in defaults, the
/// optional file, then prefixed environment variables (`__` separates nested
/// keys).
#[derive(Debug, Clone)]
pub struct ConfigEngine {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigEngine {
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Add a YAML (`.yaml`/`.yml`) or TOML (`.toml`) file source
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(AuthzConfig::default()));

        if let Some(ref path) = self.file {
            if !path.exists() {
                return Err(ConfigError::SourceNotFound(path.display().to_string()));
            }

            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();

            figment = match extension.as_str() {
                "yaml" | "yml" => figment.merge(Yaml::file(path)),
                "toml" => figment.merge(Toml::file(path)),
                other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
            };
            debug!("Merged configuration file {}", path.display());
        }

        Ok(figment.merge(Env::prefixed(&self.env_prefix).split("__")))
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<AuthzConfig> {
        let config: AuthzConfig = self
            .figment()?
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;

        info!(
            backend = %config.store.backend,
            max_connections = config.store.max_connections,
            "Configuration loaded"
        );
        Ok(config)
    }
}
