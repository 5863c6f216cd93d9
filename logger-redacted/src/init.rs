use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggerConfig};

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured level
fn build_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|_| LoggerError::InvalidFilter(config.level.clone())),
    }
}

/// Install the global tracing subscriber
pub fn init_logging(config: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
    };

    result.map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        level = %config.level,
        format = ?config.format,
        redaction = config.redaction_enabled,
        "Logging initialized"
    );
    Ok(())
}
