// Logger configuration
use serde::{Deserialize, Serialize};

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default filter directive, overridden by `RUST_LOG` when set
    pub level: String,
    pub format: LogFormat,
    /// Hash subject ids and mask e-mail addresses before they reach the log
    pub redaction_enabled: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            redaction_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: LoggerConfig = serde_json::from_str(r#"{ "format": "json" }"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert!(config.redaction_enabled);
    }
}
