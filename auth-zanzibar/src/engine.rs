use logger_redacted::LogRedactor;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    check::PermissionChecker,
    error::{Result, ZanzibarError},
    models::*,
    repository::{InsertOutcome, TupleRepository},
    schema::InheritanceMap,
};

/// Core authorization engine
///
/// Stateless apart from the injected inheritance map: every call goes to the
/// tuple store, so grants and revokes are visible to the next check.
pub struct AuthorizationEngine {
    /// Storage for relation tuples
    repository: Arc<dyn TupleRepository>,

    /// Relation inheritance used by checks
    inheritance: Arc<InheritanceMap>,

    checker: PermissionChecker,

    /// Renders subject ids for log output
    redactor: LogRedactor,
}

impl AuthorizationEngine {
    /// Create an engine over the given store with the standard inheritance map
    pub fn new(repository: Arc<dyn TupleRepository>) -> Self {
        let inheritance = Arc::new(InheritanceMap::standard());
        let redactor = LogRedactor::default();
        let checker =
            PermissionChecker::new(repository.clone(), inheritance.clone(), redactor.clone());

        Self {
            repository,
            inheritance,
            checker,
            redactor,
        }
    }

    /// Replace the inheritance map
    pub fn with_inheritance(mut self, inheritance: InheritanceMap) -> Self {
        self.inheritance = Arc::new(inheritance);
        self.rebuild_checker();
        self
    }

    /// Replace the log redactor
    pub fn with_redactor(mut self, redactor: LogRedactor) -> Self {
        self.redactor = redactor;
        self.rebuild_checker();
        self
    }

    fn rebuild_checker(&mut self) {
        self.checker = PermissionChecker::new(
            self.repository.clone(),
            self.inheritance.clone(),
            self.redactor.clone(),
        );
    }

    pub fn inheritance(&self) -> &InheritanceMap {
        &self.inheritance
    }

    pub fn redactor(&self) -> &LogRedactor {
        &self.redactor
    }

    // =============================================================================
    // Core Authorization Operations
    // =============================================================================

    /// Check if `user_id` holds `relation` on `namespace:object_id`.
    ///
    /// A nonexistent object is indistinguishable from one the user has no
    /// access to; both yield `false`.
    pub async fn check(
        &self,
        user_id: &str,
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
    ) -> Result<bool> {
        Ok(self
            .check_with_trace(user_id, namespace, object_id, relation)
            .await?
            .allowed)
    }

    /// Check and report which rule decided
    pub async fn check_with_trace(
        &self,
        user_id: &str,
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
    ) -> Result<CheckDecision> {
        self.checker
            .check(user_id, namespace, object_id, relation)
            .await
    }

    /// Evaluate several checks in order
    pub async fn batch_check(&self, requests: &[CheckRequest]) -> Result<Vec<bool>> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            results.push(
                self.check(
                    &request.user_id,
                    request.namespace,
                    &request.object_id,
                    request.relation,
                )
                .await?,
            );
        }

        Ok(results)
    }

    /// Objects in `namespace` on which the user holds a direct `relation` tuple.
    ///
    /// Neither inheritance, system overrides nor wildcards are applied, so this
    /// is narrower than [`check`](Self::check): an owner of a post is not
    /// listed as its editor.
    pub async fn list_accessible(
        &self,
        user_id: &str,
        namespace: Namespace,
        relation: Relation,
    ) -> Result<Vec<String>> {
        let filter = TupleFilter::for_subject(SubjectType::User, user_id)
            .namespace(namespace)
            .relation(relation);

        let mut object_ids: Vec<String> = self
            .repository
            .find_many(&filter)
            .await?
            .into_iter()
            .map(|tuple| tuple.object_id)
            .collect();
        object_ids.sort();
        object_ids.dedup();

        Ok(object_ids)
    }

    // =============================================================================
    // Tuple Management
    // =============================================================================

    fn validate_tuple(namespace: Namespace, object_id: &str, subject_id: &str) -> Result<()> {
        if object_id.trim().is_empty() {
            return Err(ZanzibarError::Validation("object_id must not be empty".to_string()));
        }
        if subject_id.trim().is_empty() {
            return Err(ZanzibarError::Validation("subject_id must not be empty".to_string()));
        }
        if namespace == Namespace::System && object_id != SYSTEM_OBJECT_ID {
            return Err(ZanzibarError::Validation(format!(
                "system tuples must use object id '{}', got '{}'",
                SYSTEM_OBJECT_ID, object_id
            )));
        }
        Ok(())
    }

    /// Write a relation tuple; granting an existing tuple is a no-op
    pub async fn grant(
        &self,
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
        subject_type: SubjectType,
        subject_id: &str,
    ) -> Result<GrantOutcome> {
        Self::validate_tuple(namespace, object_id, subject_id)?;

        let tuple = RelationTuple::new(namespace, object_id, relation, subject_type, subject_id);

        match self.repository.insert(&tuple).await? {
            InsertOutcome::Inserted => {
                info!(
                    subject = %self.redactor.subject(subject_id),
                    subject_type = %subject_type,
                    "Granted {}:{}#{}", namespace, object_id, relation
                );
                Ok(GrantOutcome::Created(tuple))
            }
            InsertOutcome::Duplicate => {
                debug!(
                    subject = %self.redactor.subject(subject_id),
                    "Tuple {}:{}#{} already granted", namespace, object_id, relation
                );
                Ok(GrantOutcome::AlreadyExists)
            }
        }
    }

    /// Delete a single tuple; revoking an absent tuple returns 0
    pub async fn revoke(
        &self,
        namespace: Namespace,
        object_id: &str,
        relation: Relation,
        subject_type: SubjectType,
        subject_id: &str,
    ) -> Result<u64> {
        let filter = TupleFilter::exact(namespace, object_id, relation, subject_type, subject_id);
        let removed = self.repository.delete_many(&filter).await?;

        info!(
            subject = %self.redactor.subject(subject_id),
            subject_type = %subject_type,
            removed,
            "Revoked {}:{}#{}", namespace, object_id, relation
        );
        Ok(removed)
    }

    /// Delete every tuple on an object, whatever the relation or subject.
    ///
    /// The engine does not observe resource deletion; the deletion path of the
    /// resource must call this (or [`on_resource_deleted`](Self::on_resource_deleted)).
    pub async fn revoke_all(&self, namespace: Namespace, object_id: &str) -> Result<u64> {
        if object_id.trim().is_empty() {
            return Err(ZanzibarError::Validation("object_id must not be empty".to_string()));
        }

        let removed = self
            .repository
            .delete_many(&TupleFilter::object(namespace, object_id))
            .await?;

        info!(removed, "Revoked all tuples on {}:{}", namespace, object_id);
        Ok(removed)
    }

    // =============================================================================
    // Resource Lifecycle
    // =============================================================================

    /// Make the creator of a resource its owner
    pub async fn grant_owner(
        &self,
        namespace: Namespace,
        object_id: &str,
        owner_id: &str,
    ) -> Result<GrantOutcome> {
        self.grant(namespace, object_id, Relation::Owner, SubjectType::User, owner_id)
            .await
    }

    /// Cascade cleanup for a destroyed resource
    pub async fn on_resource_deleted(&self, namespace: Namespace, object_id: &str) -> Result<u64> {
        let removed = self.revoke_all(namespace, object_id).await?;
        debug!(removed, "Cascaded deletion of {}:{}", namespace, object_id);
        Ok(removed)
    }

    // =============================================================================
    // System Roles
    // =============================================================================

    /// Replace the user's platform role.
    ///
    /// Revokes both system tuples, then grants the one for `role`. The two
    /// steps are not atomic: a concurrent check may briefly see no role.
    pub async fn set_system_role(&self, user_id: &str, role: SystemRole) -> Result<()> {
        for relation in [Relation::Admin, Relation::Moderator] {
            if role.relation() != Some(relation) {
                self.revoke(
                    Namespace::System,
                    SYSTEM_OBJECT_ID,
                    relation,
                    SubjectType::User,
                    user_id,
                )
                .await?;
            }
        }

        if let Some(relation) = role.relation() {
            self.grant(
                Namespace::System,
                SYSTEM_OBJECT_ID,
                relation,
                SubjectType::User,
                user_id,
            )
            .await?;
        }

        info!(subject = %self.redactor.subject(user_id), %role, "System role set");
        Ok(())
    }

    /// Effective platform role; admin wins over moderator
    pub async fn system_role(&self, user_id: &str) -> Result<SystemRole> {
        if self
            .check(user_id, Namespace::System, SYSTEM_OBJECT_ID, Relation::Admin)
            .await?
        {
            return Ok(SystemRole::Admin);
        }
        if self
            .check(user_id, Namespace::System, SYSTEM_OBJECT_ID, Relation::Moderator)
            .await?
        {
            return Ok(SystemRole::Moderator);
        }
        Ok(SystemRole::User)
    }
}
