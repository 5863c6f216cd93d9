use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::{Result, ZanzibarError};
use crate::models::*;

pub mod postgres;

pub use postgres::PostgresTupleRepository;

/// Outcome of a duplicate-safe insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A tuple with the same five-field key already exists
    Duplicate,
}

/// Persistence interface for relation tuples.
///
/// Every filter is an exact-match conjunction. Implementations must enforce
/// uniqueness of the five-field key and report a duplicate insert as
/// [`InsertOutcome::Duplicate`] rather than an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TupleRepository: Send + Sync {
    /// First tuple matching the filter
    async fn find_one(&self, filter: &TupleFilter) -> Result<Option<RelationTuple>>;

    /// All tuples matching the filter
    async fn find_many(&self, filter: &TupleFilter) -> Result<Vec<RelationTuple>>;

    async fn insert(&self, tuple: &RelationTuple) -> Result<InsertOutcome>;

    /// Delete every matching tuple and return how many were removed.
    /// An empty filter is rejected.
    async fn delete_many(&self, filter: &TupleFilter) -> Result<u64>;
}

pub(crate) fn reject_unfiltered_delete(filter: &TupleFilter) -> Result<()> {
    if filter.is_empty() {
        return Err(ZanzibarError::Validation(
            "Refusing to delete with an empty tuple filter".to_string(),
        ));
    }
    Ok(())
}

/// In-memory tuple repository for tests, tooling and single-process deployments
#[derive(Clone, Default)]
pub struct InMemoryTupleRepository {
    tuples: Arc<DashMap<TupleKey, RelationTuple>>,
}

impl InMemoryTupleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

#[async_trait]
impl TupleRepository for InMemoryTupleRepository {
    async fn find_one(&self, filter: &TupleFilter) -> Result<Option<RelationTuple>> {
        if let Some(key) = filter.as_key() {
            return Ok(self.tuples.get(&key).map(|entry| entry.value().clone()));
        }

        Ok(self
            .tuples
            .iter()
            .find(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone()))
    }

    async fn find_many(&self, filter: &TupleFilter) -> Result<Vec<RelationTuple>> {
        let mut tuples: Vec<RelationTuple> = self
            .tuples
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        // DashMap iteration order is arbitrary
        tuples.sort_by_key(RelationTuple::key);
        Ok(tuples)
    }

    async fn insert(&self, tuple: &RelationTuple) -> Result<InsertOutcome> {
        match self.tuples.entry(tuple.key()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(tuple.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn delete_many(&self, filter: &TupleFilter) -> Result<u64> {
        reject_unfiltered_delete(filter)?;

        if let Some(key) = filter.as_key() {
            return Ok(u64::from(self.tuples.remove(&key).is_some()));
        }

        let mut removed = 0u64;
        self.tuples.retain(|_, tuple| {
            if filter.matches(tuple) {
                removed += 1;
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(post: &str, user: &str) -> RelationTuple {
        RelationTuple::user(Namespace::Post, post, Relation::Owner, user)
    }

    #[tokio::test]
    async fn test_insert_is_duplicate_safe() {
        let repo = InMemoryTupleRepository::new();
        let tuple = owner("p1", "u1");

        assert_eq!(repo.insert(&tuple).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(repo.insert(&tuple).await.unwrap(), InsertOutcome::Duplicate);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_find_one_and_many() {
        let repo = InMemoryTupleRepository::new();
        repo.insert(&owner("p2", "u1")).await.unwrap();
        repo.insert(&owner("p1", "u1")).await.unwrap();
        repo.insert(&owner("p3", "u2")).await.unwrap();

        let exact = TupleFilter::from(&owner("p1", "u1").key());
        assert!(repo.find_one(&exact).await.unwrap().is_some());

        let by_user = TupleFilter::for_subject(SubjectType::User, "u1").namespace(Namespace::Post);
        let found = repo.find_many(&by_user).await.unwrap();
        let ids: Vec<_> = found.iter().map(|t| t.object_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        let missing = TupleFilter::object(Namespace::Comment, "p1");
        assert!(repo.find_one(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_many_counts() {
        let repo = InMemoryTupleRepository::new();
        repo.insert(&owner("p1", "u1")).await.unwrap();
        repo.insert(&RelationTuple::user(Namespace::Post, "p1", Relation::Viewer, "*"))
            .await
            .unwrap();
        repo.insert(&owner("p2", "u1")).await.unwrap();

        let removed = repo
            .delete_many(&TupleFilter::object(Namespace::Post, "p1"))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(repo.len(), 1);

        let exact = TupleFilter::from(&owner("p9", "u1").key());
        assert_eq!(repo.delete_many(&exact).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_filter_delete_rejected() {
        let repo = InMemoryTupleRepository::new();
        repo.insert(&owner("p1", "u1")).await.unwrap();

        let result = repo.delete_many(&TupleFilter::default()).await;
        assert!(matches!(result, Err(ZanzibarError::Validation(_))));
        assert_eq!(repo.len(), 1);
    }
}
