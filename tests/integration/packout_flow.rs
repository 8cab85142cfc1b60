//! Integration tests for the scan-to-submission packout flow

use super::common::stub_backend::{sample_order, StubBackend, TEST_USERNAME};
use packline::orders::LookupError;
use packline::packout::{PhotoCategory, PhotoRef};
use packline::{
    ApiClient, AuthSession, Config, Database, KvStore, OfflineOutbox, Order, OrderLookup,
    PackoutEngine, Resolution, SessionStore, SubmitOutcome,
};
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

/// Tick every open checklist item and photo obligation until terminal
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
async fn full_walkthrough_delivers_a_complete_report() {
    let stub = StubBackend::start().await;
    stub.accept_token("tok-packer");
    stub.insert_order("ORD-2024-0042", sample_order(42, "ORD-2024-0042"));
    let (_dir, kv, client) = signed_in_stack(&stub.base_url);

    let lookup = OrderLookup::new(client.clone(), false);
    let resolution = lookup.resolve("ORD-2024-0042").await.expect("resolve");
    let Resolution::Confirmed(order) = resolution else {
        panic!("expected confirmed order");
    };
    assert_eq!(order.id, 42);
    assert_eq!(order.items.len(), 2);

    let mut engine = PackoutEngine::start(kv.clone(), &order);
    drive_to_completion(&mut engine);

    let outbox = OfflineOutbox::new(kv.clone());
    let outcome = engine.submit(&client, &outbox).await.expect("submit");
    assert_eq!(outcome, SubmitOutcome::Delivered);

    // clean slate locally, full report at the backend
    assert!(kv.get("packout_42").expect("kv read").is_none());
    let completions = stub.completions();
    assert_eq!(completions.len(), 1);
    let report = &completions[0];
    assert_eq!(report["order_id"], 42);
    assert_eq!(report["order_number"], "ORD-2024-0042");
    assert_eq!(report["status"], "completed");
    let steps = report["steps_completed"].as_array().expect("steps");
    assert_eq!(steps.len(), 5);
    assert!(steps.iter().all(|s| s["completed"] == true));
    let photos = report["compliance_photos"].as_array().expect("photos");
    assert_eq!(photos.len(), 4);
    assert!(photos.iter().all(|p| p["file_path"] == "/warehouse/photos/carton.jpg"));
}

#[tokio::test]
async fn workflow_resumes_across_a_database_reopen() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("packline.db");
    let order: Order =
        serde_json::from_value(sample_order(42, "ORD-2024-0042")).expect("order fixture");

    // first "process": verify items, advance, photograph the inspection
    {
        let db = Database::open(db_path.clone()).expect("open database");
        let kv = KvStore::new(db.connection());
        let mut engine = PackoutEngine::start(kv, &order);
        let items: Vec<u32> = engine.session().steps[0].checklist.iter().map(|i| i.id).collect();
        for id in items {
            engine.toggle_checklist_item(0, id).expect("toggle");
        }
        engine.advance().expect("advance");
        engine.record_photo(
            PhotoCategory::Damage,
            PhotoRef::from("/warehouse/photos/scratch.jpg"),
            Some("scuffed corner, packed anyway".to_string()),
        );
    }

    // second "process": everything is exactly where it was left
    let db = Database::open(db_path).expect("reopen database");
    let kv = KvStore::new(db.connection());
    let engine = PackoutEngine::start(kv, &order);
    let session = engine.session();
    assert_eq!(session.current_step_index, 1);
    assert!(session.steps[0].completed);
    assert!(session.steps[1].photo_taken);
    assert_eq!(session.compliance_photos.len(), 1);
    assert_eq!(
        session.compliance_photos[0].notes.as_deref(),
        Some("scuffed corner, packed anyway")
    );
}

#[tokio::test]
async fn degraded_lookup_is_explicit_and_repeatable() {
    let stub = StubBackend::start().await;
    stub.accept_token("tok-packer");
    stub.insert_order("ORD-2024-0042", sample_order(42, "ORD-2024-0042"));
    let (_dir, _kv, client) = signed_in_stack(&stub.base_url);
    let lookup = OrderLookup::new(client, true);

    stub.fail_next_order_lookups(2);

    let first = lookup.resolve("ORD-2024-0042").await.expect("degraded resolve");
    let Resolution::Degraded { order, reason } = first else {
        panic!("expected degraded resolution");
    };
    assert!(!reason.is_empty());
    assert_eq!(order.order_number, "ORD-2024-0042");

    // same placeholder id on the next outage, so the session resumes
    let second = lookup.resolve("ORD-2024-0042").await.expect("degraded resolve");
    assert_eq!(second.order().id, order.id);
    assert!(second.is_degraded());

    // backend recovered: the real order comes through
    let third = lookup.resolve("ORD-2024-0042").await.expect("confirmed resolve");
    assert!(matches!(third, Resolution::Confirmed(o) if o.id == 42));
}

#[tokio::test]
async fn unknown_barcode_is_not_found_even_when_degradation_is_allowed() {
    let stub = StubBackend::start().await;
    stub.accept_token("tok-packer");
    let (_dir, _kv, client) = signed_in_stack(&stub.base_url);
    let lookup = OrderLookup::new(client, true);

    let err = lookup.resolve("ORD-MISSING").await.expect_err("must fail");
    assert!(matches!(err, LookupError::NotFound(code) if code == "ORD-MISSING"));
}

#[tokio::test]
async fn malformed_barcode_fails_before_any_network_call() {
    // unreachable backend: a network attempt would surface as Api, not InvalidBarcode
    let (_dir, _kv, client) = signed_in_stack("http://127.0.0.1:1/api");
    let lookup = OrderLookup::new(client, false);

    let err = lookup.resolve("not a barcode").await.expect_err("must fail");
    assert!(matches!(err, LookupError::InvalidBarcode(_)));
}
