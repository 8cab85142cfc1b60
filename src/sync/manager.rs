//! Replays the offline outbox against the backend.
//!
//! Dispatch is by envelope kind parsed from the key. A kind this build does
//! not recognize is logged and left queued; it must not block envelopes
//! behind it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::PackoutBackend;
use crate::data::StoreError;
use crate::sync::envelope::EnvelopeKind;
use crate::sync::outbox::{Delivery, DrainReport, OfflineOutbox};

pub struct SyncManager {
    outbox: OfflineOutbox,
    backend: Arc<dyn PackoutBackend>,
}

impl SyncManager {
    pub fn new(outbox: OfflineOutbox, backend: Arc<dyn PackoutBackend>) -> Self {
        Self { outbox, backend }
    }

    pub fn outbox(&self) -> &OfflineOutbox {
        &self.outbox
    }

    /// One cheap round trip to ask whether replay is worth attempting
    pub async fn connectivity_probe(&self) -> bool {
        self.backend.is_reachable().await
    }

    /// Replay everything pending, oldest first, stopping at the first
    /// delivery failure
    pub async fn drain(&self) -> Result<DrainReport, StoreError> {
        let backend = Arc::clone(&self.backend);
        let report = self
            .outbox
            .drain_with(move |envelope| {
                let backend = Arc::clone(&backend);
                async move {
                    match EnvelopeKind::parse(&envelope.key) {
                        EnvelopeKind::CompleteTask { order_id } => {
                            match backend.deliver_completion(&envelope.payload).await {
                                Ok(()) => {
                                    info!(key = %envelope.key, order_id, "replayed offline completion");
                                    Delivery::Delivered
                                }
                                Err(e) => {
                                    warn!(key = %envelope.key, error = %e, "offline replay failed, stopping drain");
                                    Delivery::Failed
                                }
                            }
                        }
                        EnvelopeKind::Unknown => {
                            warn!(key = %envelope.key, "unrecognized offline envelope kind, leaving queued");
                            Delivery::Skipped
                        }
                    }
                }
            })
            .await?;

        if report.delivered > 0 || report.remaining > 0 {
            info!(
                delivered = report.delivered,
                remaining = report.remaining,
                "offline drain finished"
            );
        }
        Ok(report)
    }

    /// Probe, then drain only when the backend answered
    pub async fn sync_now(&self) -> Result<DrainReport, StoreError> {
        if !self.connectivity_probe().await {
            debug!("backend unreachable, skipping outbox drain");
            let remaining = self.outbox.pending()?.len();
            return Ok(DrainReport {
                remaining,
                ..DrainReport::default()
            });
        }
        self.drain().await
    }
}
