//! Scripted backend for deterministic tests.
//!
//! Implements [`PackoutBackend`] without any network. Outcomes for successive
//! deliveries can be queued up front; an empty script means every delivery
//! succeeds while the backend is marked reachable.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::backend::PackoutBackend;
use crate::api::error::ApiError;

pub struct MockBackend {
    script: Mutex<VecDeque<Result<(), ApiError>>>,
    delivered: Mutex<Vec<Value>>,
    attempts: AtomicUsize,
    reachable: AtomicBool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            delivered: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            reachable: AtomicBool::new(true),
        }
    }

    /// Queue the outcome for the next unconsumed delivery attempt
    pub fn push_outcome(&self, outcome: Result<(), ApiError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    /// Convenience: queue `n` unreachable failures
    pub fn push_unavailable(&self, n: usize) {
        for _ in 0..n {
            self.push_outcome(Err(ApiError::Unavailable("scripted outage".to_string())));
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Payloads that were accepted (successful deliveries only)
    pub fn delivered(&self) -> Vec<Value> {
        self.delivered.lock().unwrap().clone()
    }

    /// Total delivery attempts, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackoutBackend for MockBackend {
    async fn deliver_completion(&self, payload: &Value) -> Result<(), ApiError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let scripted = self.script.lock().unwrap().pop_front();
        let outcome = match scripted {
            Some(outcome) => outcome,
            None if self.reachable.load(Ordering::SeqCst) => Ok(()),
            None => Err(ApiError::Unavailable("backend offline".to_string())),
        };

        if outcome.is_ok() {
            self.delivered.lock().unwrap().push(payload.clone());
        }
        outcome
    }

    async fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}
