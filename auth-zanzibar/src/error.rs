use error_common::{codes, ErrorKind, HasErrorKind};
use thiserror::Error;

use crate::models::Relation;

#[derive(Error, Debug)]
pub enum ZanzibarError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid inheritance map: {0}")]
    InvalidInheritance(String),

    #[error("Circular inheritance involving relation '{0}'")]
    CircularInheritance(Relation),

    /// Any store failure other than a duplicate key
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HasErrorKind for ZanzibarError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidInheritance(_)
            | Self::CircularInheritance(_)
            | Self::Persistence(_)
            | Self::Internal(_) => ErrorKind::ServerError,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => codes::validation::INVALID_INPUT,
            Self::Persistence(_) => codes::server::PERSISTENCE_FAILED,
            _ => codes::server::INTERNAL,
        }
    }
}

pub type Result<T> = std::result::Result<T, ZanzibarError>;
