//! Property checks for grant/check/revoke over arbitrary ids and relations

use auth_zanzibar::repository::InMemoryTupleRepository;
use auth_zanzibar::*;
use proptest::prelude::*;
use std::sync::Arc;

fn namespace_strategy() -> impl Strategy<Value = Namespace> {
    prop::sample::select(
        Namespace::ALL
            .into_iter()
            .filter(|ns| *ns != Namespace::System)
            .collect::<Vec<_>>(),
    )
}

fn relation_strategy() -> impl Strategy<Value = Relation> {
    prop::sample::select(Relation::ALL.to_vec())
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn grant_then_check_is_true(
        namespace in namespace_strategy(),
        relation in relation_strategy(),
        object_id in "[a-z0-9]{1,12}",
        user_id in "u[a-z0-9]{1,12}",
    ) {
        runtime().block_on(async {
            let engine = AuthorizationEngine::new(Arc::new(InMemoryTupleRepository::new()));
            engine
                .grant(namespace, &object_id, relation, SubjectType::User, &user_id)
                .await
                .unwrap();
            assert!(engine.check(&user_id, namespace, &object_id, relation).await.unwrap());
        });
    }

    #[test]
    fn revoke_then_check_is_false(
        namespace in namespace_strategy(),
        relation in relation_strategy(),
        object_id in "[a-z0-9]{1,12}",
        user_id in "u[a-z0-9]{1,12}",
    ) {
        runtime().block_on(async {
            let engine = AuthorizationEngine::new(Arc::new(InMemoryTupleRepository::new()));
            engine
                .grant(namespace, &object_id, relation, SubjectType::User, &user_id)
                .await
                .unwrap();
            let removed = engine
                .revoke(namespace, &object_id, relation, SubjectType::User, &user_id)
                .await
                .unwrap();
            assert_eq!(removed, 1);
            assert!(!engine.check(&user_id, namespace, &object_id, relation).await.unwrap());

            let removed_again = engine
                .revoke(namespace, &object_id, relation, SubjectType::User, &user_id)
                .await
                .unwrap();
            assert_eq!(removed_again, 0);
        });
    }

    #[test]
    fn grants_never_leak_to_other_users(
        namespace in namespace_strategy(),
        relation in relation_strategy(),
        object_id in "[a-z0-9]{1,12}",
        user_id in "u[a-z0-9]{1,12}",
        other_id in "v[a-z0-9]{1,12}",
    ) {
        runtime().block_on(async {
            let engine = AuthorizationEngine::new(Arc::new(InMemoryTupleRepository::new()));
            engine
                .grant(namespace, &object_id, relation, SubjectType::User, &user_id)
                .await
                .unwrap();
            for requested in Relation::ALL {
                assert!(!engine.check(&other_id, namespace, &object_id, requested).await.unwrap());
            }
        });
    }

    #[test]
    fn check_agrees_with_inheritance_map(
        namespace in namespace_strategy(),
        held in relation_strategy(),
        requested in relation_strategy(),
        object_id in "[a-z0-9]{1,12}",
    ) {
        runtime().block_on(async {
            let engine = AuthorizationEngine::new(Arc::new(InMemoryTupleRepository::new()));
            engine
                .grant(namespace, &object_id, held, SubjectType::User, "u1")
                .await
                .unwrap();
            let expected = engine.inheritance().satisfies(held, requested);
            assert_eq!(
                engine.check("u1", namespace, &object_id, requested).await.unwrap(),
                expected
            );
        });
    }
}
