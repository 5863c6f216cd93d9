use auth_zanzibar::{AuthorizationEngine, Namespace, Relation, SYSTEM_OBJECT_ID};
use error_common::log_error;
use logger_redacted::LogRedactor;
use std::sync::Arc;
use tracing::debug;

use crate::error::{GatewayError, Result};
use crate::session::SessionProvider;

/// Authorization entry points for route handlers.
///
/// Composes a [`SessionProvider`] with the [`AuthorizationEngine`]:
/// `require_*` methods fail with a structured [`GatewayError`], `is_*`
/// methods fail closed and never return an error.
#[derive(Clone)]
pub struct AuthGateway {
    engine: Arc<AuthorizationEngine>,
    sessions: Arc<dyn SessionProvider>,
    redactor: LogRedactor,
}

impl AuthGateway {
    /// Logs through the engine's redactor unless overridden
    pub fn new(engine: Arc<AuthorizationEngine>, sessions: Arc<dyn SessionProvider>) -> Self {
        let redactor = engine.redactor().clone();
        Self {
            engine,
            sessions,
            redactor,
        }
    }

    pub fn with_redactor(mut self, redactor: LogRedactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Same engine, different session source (e.g. one per request)
    pub fn with_sessions(&self, sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            engine: self.engine.clone(),
            sessions,
            redactor: self.redactor.clone(),
        }
    }

    pub fn engine(&self) -> &Arc<AuthorizationEngine> {
        &self.engine
    }

    /// Resolve the current user or fail with `Unauthorized`
    pub async fn current_user(&self) -> Result<String> {
        match self.sessions.current_session().await? {
            Some(session) => Ok(session.user_id),
            None => Err(GatewayError::Unauthorized),
        }
    }

    /// Require the current user to hold `relation` on `namespace:object_id`
    /// and return their id
    pub async fn require_relation(
        &self,
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
    ) -> Result<String> {
        let user_id = self.current_user().await?;

        if self
            .engine
            .check(&user_id, namespace, object_id, relation)
            .await?
        {
            debug!(
                subject = %self.redactor.subject(&user_id),
                "Authorized {}:{}#{}", namespace, object_id, relation
            );
            return Ok(user_id);
        }

        Err(GatewayError::Forbidden {
            namespace,
            object_id: object_id.to_string(),
            relation,
        })
    }

    /// Require system admin
    pub async fn require_admin(&self) -> Result<String> {
        self.require_relation(Namespace::System, SYSTEM_OBJECT_ID, Relation::Admin)
            .await
    }

    /// Require system moderator; system admins pass as well
    pub async fn require_moderator(&self) -> Result<String> {
        self.require_relation(Namespace::System, SYSTEM_OBJECT_ID, Relation::Moderator)
            .await
    }

    /// Whether the current user is a system admin. Any failure reads as `false`.
    pub async fn is_admin(&self) -> bool {
        self.fail_closed("is_admin", self.require_admin().await)
    }

    /// Whether the current user is a system moderator (or admin). Any failure
    /// reads as `false`.
    pub async fn is_moderator(&self) -> bool {
        self.fail_closed("is_moderator", self.require_moderator().await)
    }

    fn fail_closed(&self, context: &str, result: Result<String>) -> bool {
        match result {
            Ok(_) => true,
            Err(GatewayError::Unauthorized | GatewayError::Forbidden { .. }) => false,
            Err(e) => {
                log_error(context, &self.redacted(e));
                false
            }
        }
    }

    /// Session provider messages are free text and may carry e-mail addresses
    fn redacted(&self, error: GatewayError) -> GatewayError {
        match error {
            GatewayError::Session(message) => GatewayError::Session(self.redactor.redact(&message)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockSessionProvider, Session, StaticSessionProvider};
    use auth_zanzibar::repository::InMemoryTupleRepository;
    use auth_zanzibar::SystemRole;
    use error_common::{ErrorKind, HasErrorKind};

    async fn gateway_for(user: Option<&str>, role: SystemRole) -> AuthGateway {
        let engine = Arc::new(AuthorizationEngine::new(Arc::new(
            InMemoryTupleRepository::new(),
        )));
        if let Some(user_id) = user {
            engine.set_system_role(user_id, role).await.unwrap();
        }

        let sessions: Arc<dyn SessionProvider> = match user {
            Some(user_id) => Arc::new(StaticSessionProvider::authenticated(user_id)),
            None => Arc::new(StaticSessionProvider::anonymous()),
        };
        AuthGateway::new(engine, sessions)
    }

    #[tokio::test]
    async fn test_require_admin_unauthorized_without_session() {
        let gateway = gateway_for(None, SystemRole::User).await;
        let err = gateway.require_admin().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(!gateway.is_admin().await);
    }

    #[tokio::test]
    async fn test_require_admin_forbidden_for_plain_user() {
        let gateway = gateway_for(Some("u1"), SystemRole::User).await;
        let err = gateway.require_admin().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(!gateway.is_admin().await);
        assert!(!gateway.is_moderator().await);
    }

    #[tokio::test]
    async fn test_admin_passes_both() {
        let gateway = gateway_for(Some("a1"), SystemRole::Admin).await;
        assert_eq!(gateway.require_admin().await.unwrap(), "a1");
        assert_eq!(gateway.require_moderator().await.unwrap(), "a1");
        assert!(gateway.is_admin().await);
        assert!(gateway.is_moderator().await);
    }

    #[tokio::test]
    async fn test_moderator_is_not_admin() {
        let gateway = gateway_for(Some("m1"), SystemRole::Moderator).await;
        assert_eq!(gateway.require_moderator().await.unwrap(), "m1");
        assert_eq!(
            gateway.require_admin().await.unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        assert!(gateway.is_moderator().await);
        assert!(!gateway.is_admin().await);
    }

    #[tokio::test]
    async fn test_session_failure_fails_closed() {
        let mut sessions = MockSessionProvider::new();
        sessions
            .expect_current_session()
            .returning(|| Err(GatewayError::Session("cookie store offline".to_string())));

        let engine = Arc::new(AuthorizationEngine::new(Arc::new(
            InMemoryTupleRepository::new(),
        )));
        let gateway = AuthGateway::new(engine, Arc::new(sessions));

        assert_eq!(
            gateway.require_admin().await.unwrap_err().kind(),
            ErrorKind::ServerError
        );
        assert!(!gateway.is_admin().await);
        assert!(!gateway.is_moderator().await);
    }

    #[test]
    fn test_session_messages_are_redacted_before_logging() {
        let engine = Arc::new(AuthorizationEngine::new(Arc::new(
            InMemoryTupleRepository::new(),
        )));
        let gateway = AuthGateway::new(engine, Arc::new(StaticSessionProvider::anonymous()));

        let logged = gateway
            .redacted(GatewayError::Session("no cookie for alice@example.com".to_string()))
            .to_string();
        assert!(!logged.contains("alice@example.com"));
        assert!(logged.contains("EMAIL["));

        let plain = gateway.with_redactor(LogRedactor::from_enabled(false));
        let logged = plain
            .redacted(GatewayError::Session("no cookie for alice@example.com".to_string()))
            .to_string();
        assert!(logged.contains("alice@example.com"));
    }

    #[test]
    fn test_gateway_follows_engine_redaction_setting() {
        let engine = Arc::new(
            AuthorizationEngine::new(Arc::new(InMemoryTupleRepository::new()))
                .with_redactor(LogRedactor::from_enabled(false)),
        );
        let gateway = AuthGateway::new(engine, Arc::new(StaticSessionProvider::anonymous()));
        assert_eq!(gateway.redactor.subject("u1"), "u1");
    }

    #[tokio::test]
    async fn test_with_sessions_shares_engine() {
        let gateway = gateway_for(Some("a1"), SystemRole::Admin).await;
        let mut sessions = MockSessionProvider::new();
        sessions
            .expect_current_session()
            .returning(|| Ok(Some(Session::new("a1"))));

        let per_request = gateway.with_sessions(Arc::new(sessions));
        assert!(per_request.is_admin().await);
        assert!(Arc::ptr_eq(per_request.engine(), gateway.engine()));
    }
}
