use auth_zanzibar::{Namespace, Relation, ZanzibarError};
use error_common::{codes, ErrorKind, HasErrorKind};
use thiserror::Error;

/// Rejection raised by the gateway adapters.
///
/// Branch on [`HasErrorKind::kind`], not on the message. The rendered
/// messages still begin with `Unauthorized` / `Forbidden` for log readers.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unauthorized: no authenticated session")]
    Unauthorized,

    #[error("Forbidden: {relation} on {namespace}:{object_id} required")]
    Forbidden {
        namespace: Namespace,
        object_id: String,
        relation: Relation,
    },

    #[error("Session provider error: {0}")]
    Session(String),

    #[error(transparent)]
    Engine(#[from] ZanzibarError),
}

impl HasErrorKind for GatewayError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Session(_) => ErrorKind::ServerError,
            Self::Engine(e) => e.kind(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Engine(e) => e.code(),
            Self::Session(_) => codes::server::INTERNAL,
            _ => self.kind().code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
