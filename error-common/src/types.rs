use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codes;

/// Structured classification of every failure the authorization crates surface.
///
/// Callers choose HTTP status codes (or CLI exit codes) by matching on the kind,
/// never on the rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No authenticated identity
    Unauthorized,
    /// Identity present, relation absent
    Forbidden,
    NotFound,
    /// Input failed enum/format validation
    Validation,
    /// Persistence or other infrastructure failure
    ServerError,
}

impl ErrorKind {
    pub fn http_status(self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Validation => 400,
            Self::ServerError => 500,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Unauthorized => codes::authentication::SESSION_MISSING,
            Self::Forbidden => codes::authorization::ACCESS_DENIED,
            Self::NotFound => codes::not_found::RESOURCE_NOT_FOUND,
            Self::Validation => codes::validation::INVALID_INPUT,
            Self::ServerError => codes::server::INTERNAL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::ServerError => "server_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every crate-level error enum so that adapters can branch on
/// the kind without knowing the concrete error type.
pub trait HasErrorKind {
    fn kind(&self) -> ErrorKind;

    /// Specific code for this error; defaults to the kind's generic code.
    fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Wire representation of an error for JSON responses and machine-readable CLI output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorBody {
    pub fn from_error<E>(error: &E) -> Self
    where
        E: HasErrorKind + fmt::Display,
    {
        Self {
            code: error.code().to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    /// `{ "error": { "code", "kind", "message" } }`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self })
    }
}

/// Log an error together with its structured classification
pub fn log_error<E>(context: &str, error: &E)
where
    E: HasErrorKind + fmt::Display,
{
    let kind = error.kind();
    if kind == ErrorKind::ServerError {
        tracing::error!(
            context = context,
            error_kind = %kind,
            error_code = error.code(),
            error = %error,
            "Operation failed"
        );
    } else {
        tracing::warn!(
            context = context,
            error_kind = %kind,
            error_code = error.code(),
            error = %error,
            "Operation rejected"
        );
    }
}
