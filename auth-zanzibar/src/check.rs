use logger_redacted::LogRedactor;
use std::sync::Arc;
use tracing::debug;

use crate::{
    error::Result,
    models::*,
    repository::TupleRepository,
    schema::InheritanceMap,
};

/// Permission checker resolving a single relation, first match wins:
/// 1. direct tuple held by the user
/// 2. a stronger relation that implies the requested one
/// 3. system override (skipped for the `system` namespace itself)
/// 4. wildcard grant to `*`
///
/// Each step is its own store query. The queries are not wrapped in a
/// transaction, so a check racing a grant or revoke may observe the store at
/// two different points in time.
pub struct PermissionChecker {
    repository: Arc<dyn TupleRepository>,
    inheritance: Arc<InheritanceMap>,
    redactor: LogRedactor,
}

impl PermissionChecker {
    pub fn new(
        repository: Arc<dyn TupleRepository>,
        inheritance: Arc<InheritanceMap>,
        redactor: LogRedactor,
    ) -> Self {
        Self {
            repository,
            inheritance,
            redactor,
        }
    }

    /// Check if the user holds `relation` on `namespace:object_id`
    pub async fn check(
        &self,
        user_id: &str,
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
    ) -> Result<CheckDecision> {
        debug!(
            subject = %self.redactor.subject(user_id),
            "Checking {}:{}#{}", namespace, object_id, relation
        );

        if let Some(reason) = self
            .held_by_user(user_id, namespace, object_id, relation)
            .await?
        {
            debug!(%reason, "Permission granted");
            return Ok(CheckDecision::allow(reason));
        }

        if namespace != Namespace::System {
            if let Some(reason) = self.system_override(user_id, relation).await? {
                debug!(%reason, "Permission granted by system override");
                return Ok(CheckDecision::allow(reason));
            }
        }

        if self.wildcard(namespace, object_id, relation).await? {
            debug!("Permission granted by wildcard");
            return Ok(CheckDecision::allow(CheckReason::Wildcard));
        }

        debug!("Permission denied");
        Ok(CheckDecision::deny())
    }

    async fn exists(&self, filter: TupleFilter) -> Result<bool> {
        Ok(self.repository.find_one(&filter).await?.is_some())
    }

    /// Steps 1 and 2: direct tuple, then any implying relation
    async fn held_by_user(
        &self,
        user_id: &str,
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
    ) -> Result<Option<CheckReason>> {
        let direct =
            TupleFilter::exact(namespace, object_id, relation, SubjectType::User, user_id);
        if self.exists(direct).await? {
            return Ok(Some(CheckReason::Direct));
        }

        for &stronger in self.inheritance.implied_by(relation) {
            let inherited =
                TupleFilter::exact(namespace, object_id, stronger, SubjectType::User, user_id);
            if self.exists(inherited).await? {
                return Ok(Some(CheckReason::Inherited(stronger)));
            }
        }

        Ok(None)
    }

    async fn wildcard(
        &self,
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
    ) -> Result<bool> {
        let filter = TupleFilter::exact(
            namespace,
            object_id,
            relation,
            SubjectType::User,
            WILDCARD_SUBJECT,
        );
        self.exists(filter).await
    }

    /// Whether the user holds `relation` on `system:global`, resolved with the
    /// same rules as any other check minus the override step
    async fn holds_system(&self, user_id: &str, relation: Relation) -> Result<bool> {
        if self
            .held_by_user(user_id, Namespace::System, SYSTEM_OBJECT_ID, relation)
            .await?
            .is_some()
        {
            return Ok(true);
        }
        self.wildcard(Namespace::System, SYSTEM_OBJECT_ID, relation)
            .await
    }

    /// Step 3: system admin passes everything, system moderator passes
    /// moderator and admin checks
    async fn system_override(
        &self,
        user_id: &str,
        relation: Relation,
    ) -> Result<Option<CheckReason>> {
        if self.holds_system(user_id, Relation::Admin).await? {
            return Ok(Some(CheckReason::SystemAdmin));
        }

        if matches!(relation, Relation::Moderator | Relation::Admin)
            && self.holds_system(user_id, Relation::Moderator).await?
        {
            return Ok(Some(CheckReason::SystemModerator));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZanzibarError;
    use crate::repository::{InMemoryTupleRepository, MockTupleRepository};

    fn checker_with(repo: Arc<dyn TupleRepository>) -> PermissionChecker {
        PermissionChecker::new(
            repo,
            Arc::new(InheritanceMap::standard()),
            LogRedactor::default(),
        )
    }

    #[tokio::test]
    async fn test_direct_permission() {
        let repo = Arc::new(InMemoryTupleRepository::new());
        let checker = checker_with(repo.clone());

        let decision = checker
            .check("u1", Namespace::Post, "p1", Relation::Viewer)
            .await
            .unwrap();
        assert_eq!(decision, CheckDecision::deny());

        repo.insert(&RelationTuple::user(Namespace::Post, "p1", Relation::Viewer, "u1"))
            .await
            .unwrap();

        let decision = checker
            .check("u1", Namespace::Post, "p1", Relation::Viewer)
            .await
            .unwrap();
        assert_eq!(decision, CheckDecision::allow(CheckReason::Direct));
    }

    #[tokio::test]
    async fn test_inherited_permission() {
        let repo = Arc::new(InMemoryTupleRepository::new());
        let checker = checker_with(repo.clone());

        repo.insert(&RelationTuple::user(Namespace::Post, "p1", Relation::Owner, "u1"))
            .await
            .unwrap();

        let decision = checker
            .check("u1", Namespace::Post, "p1", Relation::Editor)
            .await
            .unwrap();
        assert_eq!(
            decision,
            CheckDecision::allow(CheckReason::Inherited(Relation::Owner))
        );
    }

    #[tokio::test]
    async fn test_system_namespace_skips_override() {
        let repo = Arc::new(InMemoryTupleRepository::new());
        let checker = checker_with(repo.clone());

        repo.insert(&RelationTuple::user(
            Namespace::System,
            SYSTEM_OBJECT_ID,
            Relation::Admin,
            "a1",
        ))
        .await
        .unwrap();

        // admin implies moderator through inheritance, not through the override
        let decision = checker
            .check("a1", Namespace::System, SYSTEM_OBJECT_ID, Relation::Moderator)
            .await
            .unwrap();
        assert_eq!(
            decision,
            CheckDecision::allow(CheckReason::Inherited(Relation::Admin))
        );

        let decision = checker
            .check("a1", Namespace::System, SYSTEM_OBJECT_ID, Relation::Owner)
            .await
            .unwrap();
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let mut repo = MockTupleRepository::new();
        repo.expect_find_one()
            .returning(|_| Err(ZanzibarError::Persistence("connection reset".to_string())));

        let checker = checker_with(Arc::new(repo));
        let result = checker
            .check("u1", Namespace::Post, "p1", Relation::Viewer)
            .await;
        assert!(matches!(result, Err(ZanzibarError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_first_match_stops_querying() {
        let mut repo = MockTupleRepository::new();
        repo.expect_find_one()
            .times(1)
            .returning(|filter| {
                Ok(filter
                    .as_key()
                    .map(|key| RelationTuple::new(
                        key.namespace,
                        &key.object_id,
                        key.relation,
                        key.subject_type,
                        &key.subject_id,
                    )))
            });

        let checker = checker_with(Arc::new(repo));
        let decision = checker
            .check("u1", Namespace::Post, "p1", Relation::Owner)
            .await
            .unwrap();
        assert_eq!(decision.reason, CheckReason::Direct);
    }
}
