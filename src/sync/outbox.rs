//! Durable FIFO outbox over the kv store.
//!
//! Envelopes live under `offline_<key>` and survive restarts. Replay is
//! oldest-first and an envelope is deleted only after the backend accepted
//! it; a failed delivery stops the run so ordering is preserved for the next
//! attempt.

use std::future::Future;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::{KvStore, StoreError};
use crate::sync::envelope::{completion_key, storage_key, EnvelopeKind, OfflineEnvelope, OFFLINE_PREFIX};

/// What the delivery callback did with one envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Backend accepted it; the envelope is deleted
    Delivered,
    /// Not deliverable by this run; left in place, run continues
    Skipped,
    /// Delivery failed; left in place, run stops
    Failed,
}

/// Outcome of one drain run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub delivered: usize,
    pub skipped: usize,
    /// Key of the envelope whose delivery stopped the run, if any
    pub failed: Option<String>,
    /// Envelopes still queued after the run
    pub remaining: usize,
}

#[derive(Clone)]
pub struct OfflineOutbox {
    kv: KvStore,
}

impl OfflineOutbox {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Queue a payload under a logical key. Re-using a key overwrites the
    /// previous envelope.
    pub fn enqueue(&self, key: &str, payload: Value) -> Result<(), StoreError> {
        let envelope = OfflineEnvelope::new(key, payload);
        self.kv.set_json(&storage_key(key), &envelope)?;
        debug!(key, "queued offline envelope");
        Ok(())
    }

    /// Pending envelopes, oldest first (key as tiebreak). An envelope that no
    /// longer deserializes is reported and skipped rather than wedging the
    /// queue.
    pub fn pending(&self) -> Result<Vec<OfflineEnvelope>, StoreError> {
        let mut envelopes = Vec::new();
        for full_key in self.kv.list_keys(OFFLINE_PREFIX)? {
            match self.kv.get_json::<OfflineEnvelope>(&full_key) {
                Ok(Some(envelope)) => envelopes.push(envelope),
                Ok(None) => {}
                Err(e) => {
                    warn!(key = %full_key, error = %e, "unreadable offline envelope, skipping");
                }
            }
        }
        envelopes.sort_by(|a, b| {
            a.enqueued_at
                .cmp(&b.enqueued_at)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(envelopes)
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.kv.remove(&storage_key(key))
    }

    /// Queue a completion payload for an order, superseding any completion
    /// already queued for the same order. Returns the new logical key.
    pub fn replace_completion(&self, order_id: i64, payload: Value) -> Result<String, StoreError> {
        for envelope in self.pending()? {
            if EnvelopeKind::parse(&envelope.key) == (EnvelopeKind::CompleteTask { order_id }) {
                debug!(key = %envelope.key, order_id, "dropping superseded completion envelope");
                self.remove(&envelope.key)?;
            }
        }
        let key = completion_key(order_id, Utc::now().timestamp());
        self.enqueue(&key, payload)?;
        Ok(key)
    }

    /// Replay pending envelopes through `deliver`, oldest first. Deletion
    /// happens strictly after a `Delivered` outcome; the first `Failed`
    /// outcome ends the run with everything from that point still queued.
    pub async fn drain_with<F, Fut>(&self, mut deliver: F) -> Result<DrainReport, StoreError>
    where
        F: FnMut(OfflineEnvelope) -> Fut,
        Fut: Future<Output = Delivery>,
    {
        let pending = self.pending()?;
        let total = pending.len();
        let mut report = DrainReport::default();

        for envelope in pending {
            let key = envelope.key.clone();
            match deliver(envelope).await {
                Delivery::Delivered => {
                    self.remove(&key)?;
                    report.delivered += 1;
                }
                Delivery::Skipped => {
                    report.skipped += 1;
                }
                Delivery::Failed => {
                    report.failed = Some(key);
                    break;
                }
            }
        }

        report.remaining = total - report.delivered;
        Ok(report)
    }
}
