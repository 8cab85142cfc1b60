//! Integration tests for login, session persistence, and app bootstrap

use std::sync::Arc;

use super::common::stub_backend::{StubBackend, TEST_PASSWORD, TEST_USERNAME};
use packline::{
    ApiClient, ApiError, AuthSession, Bootstrap, BootstrapOutcome, Config, Database, KvStore,
    OfflineOutbox, SessionStore, SyncManager,
};
use serde_json::json;
use tempfile::TempDir;

/// Create a kv-backed stack talking to `base_url`
fn test_stack(base_url: &str) -> (TempDir, KvStore, SessionStore, ApiClient) {
    let dir = TempDir::new().expect("temp dir");
    let db = Database::open(dir.path().join("packline.db")).expect("open database");
    let kv = KvStore::new(db.connection());
    let session = SessionStore::new(kv.clone());
    let config = Config::default().with_api_base_url(base_url);
    let client = ApiClient::new(&config, session.clone());
    (dir, kv, session, client)
}

fn bootstrap_for(kv: &KvStore, session: &SessionStore, client: &ApiClient) -> Bootstrap {
    let sync = SyncManager::new(OfflineOutbox::new(kv.clone()), Arc::new(client.clone()));
    Bootstrap::new(session.clone(), client.clone(), sync)
}

fn stored_session(token: &str) -> AuthSession {
    AuthSession {
        access_token: token.to_string(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        username: Some(TEST_USERNAME.to_string()),
    }
}

#[tokio::test]
async fn login_persists_the_session_and_me_sees_the_worker() {
    let stub = StubBackend::start().await;
    let (_dir, _kv, session, client) = test_stack(&stub.base_url);

    let issued = client
        .login(TEST_USERNAME, TEST_PASSWORD)
        .await
        .expect("login succeeds");
    assert_eq!(issued.token_type, "bearer");

    let stored = session.current().expect("session persisted");
    assert_eq!(stored.access_token, issued.access_token);
    assert_eq!(stored.username.as_deref(), Some(TEST_USERNAME));

    let profile = client.me().await.expect("profile fetch");
    assert_eq!(profile.username, TEST_USERNAME);
}

#[tokio::test]
async fn bad_credentials_leave_the_store_signed_out() {
    let stub = StubBackend::start().await;
    let (_dir, _kv, session, client) = test_stack(&stub.base_url);

    let err = client
        .login(TEST_USERNAME, "wrong-password")
        .await
        .expect_err("login must fail");
    assert!(matches!(err, ApiError::AuthRejected));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn bootstrap_discards_a_token_the_backend_rejects() {
    let stub = StubBackend::start().await;
    let (_dir, kv, session, client) = test_stack(&stub.base_url);

    // stored credential the stub never issued
    session.set(&stored_session("stale-token"));
    assert!(session.is_authenticated());

    let outcome = bootstrap_for(&kv, &session, &client).run().await;
    assert_eq!(outcome, BootstrapOutcome::NotAuthenticated);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn bootstrap_keeps_the_session_when_the_backend_is_unreachable() {
    let (_dir, kv, session, client) = test_stack("http://127.0.0.1:1/api");
    session.set(&stored_session("tok-offline"));

    let outcome = bootstrap_for(&kv, &session, &client).run().await;
    let BootstrapOutcome::Authenticated { validated, .. } = outcome else {
        panic!("expected authenticated outcome, got {outcome:?}");
    };
    assert!(!validated);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn validated_bootstrap_refreshes_the_profile_and_drains_the_outbox() {
    let stub = StubBackend::start().await;
    let (_dir, kv, session, client) = test_stack(&stub.base_url);

    session.set(&stored_session("tok-accepted"));
    stub.accept_token("tok-accepted");

    let outbox = OfflineOutbox::new(kv.clone());
    outbox
        .enqueue("complete_task_42_1724300000", json!({"order_id": 42}))
        .expect("enqueue");

    let outcome = bootstrap_for(&kv, &session, &client).run().await;
    let BootstrapOutcome::Authenticated { profile, validated } = outcome else {
        panic!("expected authenticated outcome");
    };
    assert!(validated);
    assert_eq!(profile.expect("profile").username, TEST_USERNAME);
    assert_eq!(session.profile().expect("cached profile").id, 7);

    // the queued completion rode along with the entry
    assert_eq!(stub.completions().len(), 1);
    assert!(outbox.pending().expect("pending").is_empty());
}
