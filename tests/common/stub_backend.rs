//! In-process stand-in for the warehouse backend.
//!
//! Serves the same routes the production service exposes, with knobs to
//! script auth rejection and delivery failures. Binds an ephemeral port so
//! tests can run in parallel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

pub const TEST_USERNAME: &str = "dana.mills";
pub const TEST_PASSWORD: &str = "correct-horse";

#[derive(Default)]
pub struct StubState {
    /// Token the stub currently accepts on authed routes
    valid_token: Mutex<Option<String>>,
    /// Force 401 on every authed route
    reject_auth: AtomicBool,
    /// Answer 503 to the next N completion posts
    fail_completions: AtomicUsize,
    /// Answer 503 to the next N order lookups
    fail_orders: AtomicUsize,
    /// Orders by barcode
    orders: Mutex<HashMap<String, Value>>,
    /// Payloads accepted by the completion endpoint, in arrival order
    completions: Mutex<Vec<Value>>,
}

pub struct StubBackend {
    pub base_url: String,
    state: Arc<StubState>,
    server: JoinHandle<()>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());

        let api = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/me", get(me))
            .route("/orders/by-barcode/{code}", get(order_by_barcode))
            .route("/packout-tasks/complete", post(complete))
            .route("/health", get(health))
            .with_state(Arc::clone(&state));
        let app = Router::new().nest("/api", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub backend");
        let addr = listener.local_addr().expect("stub backend addr");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
            server,
        }
    }

    /// Make the stub accept a token that was never issued through login
    pub fn accept_token(&self, token: &str) {
        *self.state.valid_token.lock().unwrap() = Some(token.to_string());
    }

    pub fn set_reject_auth(&self, reject: bool) {
        self.state.reject_auth.store(reject, Ordering::SeqCst);
    }

    pub fn fail_next_completions(&self, n: usize) {
        self.state.fail_completions.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_order_lookups(&self, n: usize) {
        self.state.fail_orders.store(n, Ordering::SeqCst);
    }

    pub fn insert_order(&self, barcode: &str, order: Value) {
        self.state
            .orders
            .lock()
            .unwrap()
            .insert(barcode.to_string(), order);
    }

    pub fn completions(&self) -> Vec<Value> {
        self.state.completions.lock().unwrap().clone()
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A minimal order document in the backend's shape
pub fn sample_order(id: i64, order_number: &str) -> Value {
    json!({
        "id": id,
        "order_number": order_number,
        "customer": { "name": "Dana Mills", "email": "dana@warehouse.test" },
        "items": [
            { "sku": "SKU-A", "name": "Widget", "quantity": 2 },
            { "sku": "SKU-B", "name": "Gadget", "quantity": 1 }
        ],
        "status": "pending",
        "priority": "high"
    })
}

fn authorized(state: &StubState, headers: &HeaderMap) -> bool {
    if state.reject_auth.load(Ordering::SeqCst) {
        return false;
    }
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match (&*state.valid_token.lock().unwrap(), presented) {
        (Some(valid), Some(token)) => valid == token,
        _ => false,
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    if body["username"] == TEST_USERNAME && body["password"] == TEST_PASSWORD {
        let token = format!("tok-{}", uuid::Uuid::new_v4());
        *state.valid_token.lock().unwrap() = Some(token.clone());
        Json(json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": 3600
        }))
        .into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn me(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "id": 7,
        "username": TEST_USERNAME,
        "email": "dana@warehouse.test",
        "role": "worker",
        "is_active": true,
        "created_at": "2024-01-10T08:00:00Z",
        "updated_at": "2024-06-01T08:00:00Z"
    }))
    .into_response()
}

async fn order_by_barcode(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if take_one(&state.fail_orders) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    match state.orders.lock().unwrap().get(&code) {
        Some(order) => Json(order.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn complete(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if take_one(&state.fail_completions) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    state.completions.lock().unwrap().push(payload);
    Json(json!({ "status": "ok" })).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "warehouse-backend" }))
}
