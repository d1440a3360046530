mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use support::{eventually, store_with_token, FakeProvider};
use userdesk::models::{Credential, Identity};
use userdesk::session::{CredentialStore, MemoryCredentialStore, SessionManager, TokenPolicy};

#[tokio::test]
async fn test_sign_in_persists_identity_and_token() {
    let store = Arc::new(MemoryCredentialStore::new());
    let session = SessionManager::new(
        FakeProvider::granting("sub-1", "tok-1"),
        store.clone(),
        TokenPolicy::Cached,
    );
    assert!(!session.is_authenticated());

    let identity = session.sign_in().await.unwrap();

    assert_eq!(identity.subject, "sub-1");
    assert_eq!(session.get_token().as_deref(), Some("tok-1"));
    assert_eq!(store.identity().unwrap().subject, "sub-1");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_cancelled_sign_in_keeps_previous_state() {
    let store = store_with_token(Some("tok-old"));
    let session = SessionManager::new(FakeProvider::cancelling(), store.clone(), TokenPolicy::Cached);

    let err = session.sign_in().await.unwrap_err();

    assert!(err.is_auth());
    assert_eq!(store.token().as_deref(), Some("tok-old"));
    assert_eq!(store.identity().unwrap().subject, "operator");
}

#[tokio::test]
async fn test_sign_out_clears_both_slots() {
    let store = store_with_token(Some("tok-1"));
    let session = SessionManager::new(
        FakeProvider::granting("operator", "tok-1"),
        store.clone(),
        TokenPolicy::Cached,
    );

    session.sign_out().await.unwrap();

    assert!(store.token().is_none());
    assert!(store.identity().is_none());
    assert!(!session.is_authenticated());
    assert_eq!(session.provider().sign_out_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sign_out_clears_locally_when_provider_fails() {
    let store = store_with_token(Some("tok-1"));
    let session = SessionManager::new(
        FakeProvider::granting("operator", "tok-1").failing_sign_out(),
        store.clone(),
        TokenPolicy::Cached,
    );

    session.sign_out().await.unwrap();

    assert!(store.token().is_none());
    assert!(store.identity().is_none());
}

#[tokio::test]
async fn test_listener_persists_provider_changes() {
    let store = Arc::new(MemoryCredentialStore::new());
    let session = SessionManager::new(
        FakeProvider::granting("sub-1", "tok-1"),
        store.clone(),
        TokenPolicy::Cached,
    );
    session.start_listener();
    assert!(session.is_listening());

    // A silent refresh on the provider side
    session
        .provider()
        .emit(Some(Credential::new(Identity::new("sub-1"), "tok-rotated")));
    assert!(eventually(|| store.token().as_deref() == Some("tok-rotated")).await);
    assert_eq!(store.identity().unwrap().subject, "sub-1");

    // The provider session expired
    session.provider().emit(None);
    assert!(eventually(|| store.token().is_none()).await);
    assert!(store.identity().is_none());
}

#[tokio::test]
async fn test_start_listener_twice_keeps_one_listener() {
    let store = Arc::new(MemoryCredentialStore::new());
    let session = SessionManager::new(
        FakeProvider::granting("sub-1", "tok-1"),
        store.clone(),
        TokenPolicy::Cached,
    );
    session.start_listener();
    session.start_listener();
    assert!(session.is_listening());

    session
        .provider()
        .emit(Some(Credential::new(Identity::new("sub-2"), "tok-2")));
    assert!(eventually(|| store.token().as_deref() == Some("tok-2")).await);
}

#[tokio::test]
async fn test_cached_policy_never_calls_provider() {
    let session = SessionManager::new(
        FakeProvider::granting("operator", "tok-1").refreshing_to("tok-fresh"),
        store_with_token(Some("tok-1")),
        TokenPolicy::Cached,
    );

    assert_eq!(session.bearer_token().await.unwrap(), "tok-1");
    assert_eq!(session.provider().refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refresh_on_read_persists_fresh_token() {
    let store = store_with_token(Some("tok-1"));
    let session = SessionManager::new(
        FakeProvider::granting("operator", "tok-1").refreshing_to("tok-fresh"),
        store.clone(),
        TokenPolicy::RefreshOnRead,
    );

    assert_eq!(session.bearer_token().await.unwrap(), "tok-fresh");
    assert_eq!(store.token().as_deref(), Some("tok-fresh"));
    assert_eq!(session.provider().refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refresh_on_read_falls_back_to_stored_token() {
    let session = SessionManager::new(
        FakeProvider::granting("operator", "tok-1"),
        store_with_token(Some("tok-stored")),
        TokenPolicy::RefreshOnRead,
    );

    assert_eq!(session.bearer_token().await.unwrap(), "tok-stored");
}

#[tokio::test]
async fn test_bearer_token_without_session_is_auth_error() {
    let session = SessionManager::new(
        FakeProvider::granting("operator", "tok-1"),
        store_with_token(None),
        TokenPolicy::Cached,
    );

    let err = session.bearer_token().await.unwrap_err();
    assert!(err.is_auth());
    assert!(session.get_token().is_none());
    assert!(session.current_identity().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sign_out_is_not_undone_by_pending_change() {
    for round in 0..50 {
        let store = Arc::new(MemoryCredentialStore::new());
        let session = SessionManager::new(
            FakeProvider::granting("sub-1", "tok-1"),
            store.clone(),
            TokenPolicy::Cached,
        );
        session.start_listener();

        // Queue a refresh for the listener, then sign out right behind it.
        session
            .provider()
            .emit(Some(Credential::new(Identity::new("sub-1"), format!("tok-{}", round))));
        session.sign_out().await.unwrap();
        assert!(session.get_token().is_none(), "round {}", round);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store.token().is_none(), "round {}", round);
        assert!(store.identity().is_none(), "round {}", round);
    }
}
