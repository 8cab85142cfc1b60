//! Integration tests for offline queueing and replay of completions

use std::sync::Arc;

use super::common::stub_backend::{sample_order, StubBackend, TEST_USERNAME};
use packline::packout::{PhotoCategory, PhotoRef};
use packline::{
    ApiClient, AuthSession, Config, Database, KvStore, OfflineOutbox, Order, PackoutEngine,
    SessionStore, SubmitOutcome, SyncManager,
};
use serde_json::json;
use tempfile::TempDir;

fn signed_in_stack(base_url: &str) -> (TempDir, KvStore, ApiClient) {
    let dir = TempDir::new().expect("temp dir");
    let db = Database::open(dir.path().join("packline.db")).expect("open database");
    let kv = KvStore::new(db.connection());
    let session = SessionStore::new(kv.clone());
    session.set(&AuthSession {
        access_token: "tok-packer".to_string(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        username: Some(TEST_USERNAME.to_string()),
    });
    let config = Config::default().with_api_base_url(base_url);
    let client = ApiClient::new(&config, session);
    (dir, kv, client)
}

fn drive_to_completion(engine: &mut PackoutEngine) {
    while !engine.session().is_all_complete() {
        let index = engine.session().current_step_index;
        let open: Vec<u32> = engine.session().steps[index]
            .checklist
            .iter()
            .filter(|item| !item.completed)
            .map(|item| item.id)
            .collect();
        for id in open {
            engine.toggle_checklist_item(index, id).expect("toggle");
        }
        let step = engine.session().current_step();
        if step.photo_required && !step.photo_taken {
            engine.record_photo(
                PhotoCategory::Package,
                PhotoRef::from("/warehouse/photos/carton.jpg"),
                None,
            );
        }
        engine.advance().expect("advance");
    }
}

#[tokio::test]
async fn failed_submission_queues_offline_then_replays_exactly_once() {
    let stub = StubBackend::start().await;
    stub.accept_token("tok-packer");
    stub.insert_order("ORD-2024-0042", sample_order(42, "ORD-2024-0042"));
    let (_dir, kv, client) = signed_in_stack(&stub.base_url);

    let order: Order =
        serde_json::from_value(sample_order(42, "ORD-2024-0042")).expect("order fixture");
    let mut engine = PackoutEngine::start(kv.clone(), &order);
    drive_to_completion(&mut engine);

    // the backend refuses this delivery
    stub.fail_next_completions(1);
    let outbox = OfflineOutbox::new(kv.clone());
    let outcome = engine.submit(&client, &outbox).await.expect("submit");
    let SubmitOutcome::SavedOffline { key } = outcome else {
        panic!("expected SavedOffline, got {outcome:?}");
    };

    // exactly one envelope, under the canonical key, with the session intact
    assert!(key.starts_with("complete_task_42_"));
    let queued = kv.list_keys("offline_").expect("list");
    assert_eq!(queued, vec![format!("offline_{key}")]);
    assert!(kv.get("packout_42").expect("kv read").is_some());
    assert!(stub.completions().is_empty());

    // connectivity is back: one sync delivers it and empties the queue
    let sync = SyncManager::new(outbox.clone(), Arc::new(client.clone()));
    let report = sync.sync_now().await.expect("sync");
    assert_eq!(report.delivered, 1);
    assert_eq!(report.remaining, 0);
    assert!(outbox.pending().expect("pending").is_empty());

    let completions = stub.completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0]["order_id"], 42);

    // nothing was re-enqueued by the successful replay
    let report = sync.sync_now().await.expect("second sync");
    assert_eq!(report.delivered, 0);
    assert_eq!(stub.completions().len(), 1);
}

#[tokio::test]
async fn replay_is_fifo_and_stops_at_the_first_refusal() {
    let stub = StubBackend::start().await;
    stub.accept_token("tok-packer");
    let (_dir, kv, client) = signed_in_stack(&stub.base_url);

    let outbox = OfflineOutbox::new(kv);
    outbox
        .enqueue("complete_task_1_100", json!({"order_id": 1}))
        .expect("enqueue");
    outbox
        .enqueue("complete_task_2_200", json!({"order_id": 2}))
        .expect("enqueue");

    let sync = SyncManager::new(outbox.clone(), Arc::new(client));

    // first delivery refused: the run stops, nothing is lost
    stub.fail_next_completions(1);
    let report = sync.sync_now().await.expect("sync");
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed.as_deref(), Some("complete_task_1_100"));
    assert_eq!(report.remaining, 2);
    assert!(stub.completions().is_empty());

    // next run delivers both, oldest first
    let report = sync.sync_now().await.expect("sync");
    assert_eq!(report.delivered, 2);
    let completions = stub.completions();
    assert_eq!(completions[0]["order_id"], 1);
    assert_eq!(completions[1]["order_id"], 2);
}

#[tokio::test]
async fn queued_completion_survives_a_database_reopen() {
    let stub = StubBackend::start().await;
    stub.accept_token("tok-packer");
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("packline.db");

    {
        let db = Database::open(db_path.clone()).expect("open database");
        let outbox = OfflineOutbox::new(KvStore::new(db.connection()));
        outbox
            .enqueue("complete_task_9_100", json!({"order_id": 9}))
            .expect("enqueue");
    }

    let db = Database::open(db_path).expect("reopen database");
    let kv = KvStore::new(db.connection());
    let session = SessionStore::new(kv.clone());
    session.set(&AuthSession {
        access_token: "tok-packer".to_string(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        username: None,
    });
    let client = ApiClient::new(
        &Config::default().with_api_base_url(&stub.base_url),
        session,
    );

    let outbox = OfflineOutbox::new(kv);
    assert_eq!(outbox.pending().expect("pending").len(), 1);

    let sync = SyncManager::new(outbox, Arc::new(client));
    let report = sync.sync_now().await.expect("sync");
    assert_eq!(report.delivered, 1);
    assert_eq!(stub.completions()[0]["order_id"], 9);
}
