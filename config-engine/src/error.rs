use error_common::{codes, ErrorKind, HasErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration source not found: {0}")]
    SourceNotFound(String),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration parsing failed: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl HasErrorKind for ConfigError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::SourceNotFound(_) | Self::UnsupportedFormat(_) | Self::ParseError(_) => {
                ErrorKind::ServerError
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => codes::validation::INVALID_INPUT,
            _ => codes::server::INTERNAL,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
