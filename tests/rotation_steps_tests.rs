//! # Rotation Step Tests
//!
//! Drives each of the four steps through [`Rotator::handle`] against the in-memory
//! store and checks which store calls and capability calls were made.

mod common;

use common::{
    full_service, generate_only, request, rotator, store_with_current, store_with_pending, Calls,
    SECRET_ID,
};
use secret_rotator::prelude::*;
use secret_rotator::store::StoreCall;

#[tokio::test]
async fn test_generate_stores_new_version_as_pending() {
    let store = store_with_current();
    let calls = Calls::default();

    rotator(&store, generate_only(&calls, "new"))
        .handle(&request("v2", Phase::Generate))
        .await
        .unwrap();

    assert_eq!(
        store.writes(),
        vec![StoreCall::PutPending {
            secret_id: SECRET_ID.to_string(),
            version_id: "v2".to_string(),
            secret: Secret::from("new"),
        }]
    );
    assert_eq!(calls.received(Capability::Generate), vec![vec![Secret::from("old")]]);
    assert_eq!(store.version_for(SECRET_ID, Stage::Pending).as_deref(), Some("v2"));
    assert_eq!(store.version_for(SECRET_ID, Stage::Current).as_deref(), Some("v1"));
}

#[tokio::test]
async fn test_generate_is_noop_when_token_already_current() {
    let store = store_with_current();
    let calls = Calls::default();

    rotator(&store, generate_only(&calls, "new"))
        .handle(&request("v1", Phase::Generate))
        .await
        .unwrap();

    assert_eq!(calls.total(), 0);
    assert!(store.writes().is_empty());
    assert_eq!(
        store.calls(),
        vec![StoreCall::FetchStaged {
            secret_id: SECRET_ID.to_string(),
            stage: Stage::Current,
        }]
    );
}

#[tokio::test]
async fn test_generate_keeps_binary_secrets_binary() {
    let store = store_with_current();
    let calls = Calls::default();

    rotator(&store, generate_only(&calls, vec![0u8, 159, 146, 150]))
        .handle(&request("v2", Phase::Generate))
        .await
        .unwrap();

    let stored = store.secret_for(SECRET_ID, "v2").unwrap();
    assert!(stored.is_binary());
    assert_eq!(stored.value(), &[0u8, 159, 146, 150]);
}

#[tokio::test]
async fn test_generate_failure_writes_nothing() {
    let store = store_with_current();
    let service = RotationService::new(|_current: Secret| async {
        Err::<Secret, _>(anyhow::anyhow!("password policy unavailable"))
    });

    let err = rotator(&store, service)
        .handle(&request("v2", Phase::Generate))
        .await
        .unwrap_err();

    assert_eq!(err.capability(), Some(Capability::Generate));
    assert!(err.to_string().contains("password policy unavailable"));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_generate_without_current_version_is_store_error() {
    let store = std::sync::Arc::new(InMemorySecretStore::new());
    let calls = Calls::default();

    let err = rotator(&store, generate_only(&calls, "new"))
        .handle(&request("v2", Phase::Generate))
        .await
        .unwrap_err();

    assert!(matches!(
        err.as_store_error(),
        Some(StoreError::NotFound { stage: Stage::Current, .. })
    ));
    assert_eq!(calls.total(), 0);
}

#[tokio::test]
async fn test_apply_and_validate_without_capability_touch_nothing() {
    let store = store_with_pending();
    let calls = Calls::default();
    let rotator = rotator(&store, generate_only(&calls, "unused"));

    rotator.handle(&request("v2", Phase::Apply)).await.unwrap();
    rotator.handle(&request("v2", Phase::Validate)).await.unwrap();

    assert!(store.calls().is_empty());
    assert_eq!(calls.total(), 0);
}

#[tokio::test]
async fn test_apply_receives_current_and_pending() {
    let store = store_with_pending();
    let calls = Calls::default();

    rotator(&store, full_service(&calls, "unused"))
        .handle(&request("v2", Phase::Apply))
        .await
        .unwrap();

    assert_eq!(
        calls.received(Capability::Apply),
        vec![vec![Secret::from("old"), Secret::from("new")]]
    );
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_apply_is_noop_when_token_already_current() {
    let store = store_with_pending();
    let calls = Calls::default();

    rotator(&store, full_service(&calls, "unused"))
        .handle(&request("v1", Phase::Apply))
        .await
        .unwrap();

    assert_eq!(calls.total(), 0);
    // Pending is never read once current matches
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test]
async fn test_apply_skips_when_pending_is_another_version() {
    let store = store_with_pending();
    let calls = Calls::default();

    rotator(&store, full_service(&calls, "unused"))
        .handle(&request("v3", Phase::Apply))
        .await
        .unwrap();

    assert_eq!(calls.count(Capability::Apply), 0);
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_validate_skips_when_pending_is_another_version() {
    let store = store_with_pending();
    let calls = Calls::default();

    rotator(&store, full_service(&calls, "unused"))
        .handle(&request("v3", Phase::Validate))
        .await
        .unwrap();

    assert_eq!(calls.count(Capability::Validate), 0);
}

#[tokio::test]
async fn test_validate_never_reads_current() {
    let store = store_with_pending();
    let calls = Calls::default();

    rotator(&store, full_service(&calls, "unused"))
        .handle(&request("v2", Phase::Validate))
        .await
        .unwrap();

    assert_eq!(calls.received(Capability::Validate), vec![vec![Secret::from("new")]]);
    assert_eq!(
        store.calls(),
        vec![StoreCall::FetchStaged {
            secret_id: SECRET_ID.to_string(),
            stage: Stage::Pending,
        }]
    );
}

#[tokio::test]
async fn test_validate_failure_propagates() {
    let store = store_with_pending();
    let calls = Calls::default();
    let service = generate_only(&calls, "unused").with_validate(|_pending: Secret| async {
        Err::<(), _>(anyhow::anyhow!("login rejected"))
    });

    let err = rotator(&store, service)
        .handle(&request("v2", Phase::Validate))
        .await
        .unwrap_err();

    assert_eq!(err.capability(), Some(Capability::Validate));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_promote_without_hook_moves_current_once() {
    let store = store_with_pending();
    let calls = Calls::default();

    rotator(&store, generate_only(&calls, "unused"))
        .handle(&request("v2", Phase::Promote))
        .await
        .unwrap();

    assert_eq!(
        store.writes(),
        vec![StoreCall::PromoteToCurrent {
            secret_id: SECRET_ID.to_string(),
            new_version_id: "v2".to_string(),
            old_version_id: "v1".to_string(),
        }]
    );
    assert_eq!(store.version_for(SECRET_ID, Stage::Current).as_deref(), Some("v2"));
    assert_eq!(store.version_for(SECRET_ID, Stage::Previous).as_deref(), Some("v1"));
}

#[tokio::test]
async fn test_promote_runs_hook_before_promotion() {
    let store = store_with_pending();
    let calls = Calls::default();

    rotator(&store, full_service(&calls, "unused"))
        .handle(&request("v2", Phase::Promote))
        .await
        .unwrap();

    assert_eq!(calls.received(Capability::PromoteHook), vec![vec![Secret::from("new")]]);
    assert_eq!(store.writes().len(), 1);
    assert_eq!(store.version_for(SECRET_ID, Stage::Current).as_deref(), Some("v2"));
}

#[tokio::test]
async fn test_promote_skips_hook_but_still_promotes_when_pending_differs() {
    let store = store_with_pending();
    // v3 exists but is not pending
    store.insert_version(SECRET_ID, "v3", "newer", &[]);
    let calls = Calls::default();

    rotator(&store, full_service(&calls, "unused"))
        .handle(&request("v3", Phase::Promote))
        .await
        .unwrap();

    assert_eq!(calls.count(Capability::PromoteHook), 0);
    assert_eq!(
        store.writes(),
        vec![StoreCall::PromoteToCurrent {
            secret_id: SECRET_ID.to_string(),
            new_version_id: "v3".to_string(),
            old_version_id: "v1".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_promote_hook_failure_leaves_store_untouched() {
    let store = store_with_pending();
    let calls = Calls::default();
    let service = generate_only(&calls, "unused").with_promote_hook(|_pending: Secret| async {
        Err::<(), _>(anyhow::anyhow!("drain failed"))
    });

    let err = rotator(&store, service)
        .handle(&request("v2", Phase::Promote))
        .await
        .unwrap_err();

    assert_eq!(err.capability(), Some(Capability::PromoteHook));
    assert!(store.writes().is_empty());
    assert_eq!(store.version_for(SECRET_ID, Stage::Current).as_deref(), Some("v1"));
}

#[tokio::test]
async fn test_full_rotation_then_redelivery_is_idempotent() {
    let store = store_with_current();
    let calls = Calls::default();
    let rotator = rotator(&store, full_service(&calls, "new"));

    for phase in Phase::ALL {
        rotator.handle(&request("v2", phase)).await.unwrap();
    }
    assert_eq!(store.version_for(SECRET_ID, Stage::Current).as_deref(), Some("v2"));
    assert_eq!(store.secret_for(SECRET_ID, "v2"), Some(Secret::from("new")));
    let writes_after_rotation = store.writes().len();
    let capability_calls = calls.total();

    // Generate and apply short-circuit once v2 is current
    rotator.handle(&request("v2", Phase::Generate)).await.unwrap();
    rotator.handle(&request("v2", Phase::Apply)).await.unwrap();

    assert_eq!(store.writes().len(), writes_after_rotation);
    assert_eq!(calls.total(), capability_calls);

    // The first promotion cleared pending, so re-deliver without a hook. Promote
    // still re-issues the label move, which leaves v2 current.
    let hookless = common::rotator(&store, generate_only(&calls, "new"));
    hookless.handle(&request("v2", Phase::Promote)).await.unwrap();

    let writes = store.writes();
    assert_eq!(writes.len(), writes_after_rotation + 1);
    assert_eq!(
        writes.last(),
        Some(&StoreCall::PromoteToCurrent {
            secret_id: SECRET_ID.to_string(),
            new_version_id: "v2".to_string(),
            old_version_id: "v2".to_string(),
        })
    );
    assert_eq!(store.version_for(SECRET_ID, Stage::Current).as_deref(), Some("v2"));
    assert_eq!(calls.total(), capability_calls);
}
