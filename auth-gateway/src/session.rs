use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Authenticated identity resolved for the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
        }
    }
}

/// Resolves the session of the current request.
///
/// `Ok(None)` means the request is anonymous; `Err` means the provider itself
/// failed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>>;
}

/// Provider that always returns the same session
#[derive(Debug, Clone, Default)]
pub struct StaticSessionProvider {
    session: Option<Session>,
}

impl StaticSessionProvider {
    pub fn anonymous() -> Self {
        Self { session: None }
    }

    pub fn authenticated(user_id: &str) -> Self {
        Self {
            session: Some(Session::new(user_id)),
        }
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.clone())
    }
}
