//! The packout workflow state machine.
//!
//! A linear forward/backward stepper over the fixed step sequence, with a
//! terminal completed state. Every mutation writes the whole session back to
//! the kv store before returning, so any later process picks up exactly this
//! state. A failed write is logged and the in-memory state stands; the
//! operator keeps working and the next successful write catches up.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::PackoutBackend;
use crate::data::{KvStore, StoreError};
use crate::orders::Order;
use crate::packout::photo::{CompliancePhoto, PhotoCategory, PhotoRef};
use crate::packout::session::{session_key, CompletionReport, PackoutSession, PackoutStatus};
use crate::sync::OfflineOutbox;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("step index {0} is out of range")]
    StepOutOfRange(usize),
    #[error("no checklist item {0} on that step")]
    UnknownChecklistItem(u32),
    #[error("current step is not complete")]
    StepIncomplete,
    #[error("already at the first step")]
    AtFirstStep,
    #[error("workflow is not complete")]
    NotReadyToSubmit,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a completion submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Backend accepted it; the persisted session is gone
    Delivered,
    /// Delivery failed; the payload is queued under `key` and the session is
    /// still persisted for resume
    SavedOffline { key: String },
}

pub struct PackoutEngine {
    kv: KvStore,
    session: PackoutSession,
}

impl PackoutEngine {
    /// Enter the workflow for an order: resume the persisted session if one
    /// exists, otherwise instantiate the template. A persisted record that no
    /// longer loads is replaced by a fresh session rather than trusted.
    pub fn start(kv: KvStore, order: &Order) -> Self {
        let key = session_key(order.id);
        let session = match kv.get_json::<PackoutSession>(&key) {
            Ok(Some(existing)) if existing.is_well_formed() => {
                info!(
                    order_id = order.id,
                    step = existing.current_step_index + 1,
                    "resuming persisted packout session"
                );
                existing
            }
            Ok(Some(_)) => {
                warn!(order_id = order.id, "persisted packout session is malformed, starting fresh");
                PackoutSession::new(order)
            }
            Ok(None) => {
                debug!(order_id = order.id, "starting new packout session");
                PackoutSession::new(order)
            }
            Err(e) => {
                warn!(
                    order_id = order.id,
                    error = %e,
                    "could not load persisted packout session, starting fresh"
                );
                PackoutSession::new(order)
            }
        };

        let engine = Self { kv, session };
        engine.persist();
        engine
    }

    /// Reopen the persisted session for an order without a fresh `Order` in
    /// hand. Yields nothing when no usable session is stored; the caller has
    /// to go through a scan to build one.
    pub fn resume(kv: KvStore, order_id: i64) -> Option<Self> {
        match kv.get_json::<PackoutSession>(&session_key(order_id)) {
            Ok(Some(session)) if session.is_well_formed() => Some(Self { kv, session }),
            Ok(Some(_)) => {
                warn!(order_id, "persisted packout session is malformed");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(order_id, error = %e, "could not load persisted packout session");
                None
            }
        }
    }

    pub fn session(&self) -> &PackoutSession {
        &self.session
    }

    /// Flip a checklist item on any step. Backward review of an earlier step
    /// is allowed; the advance gate only ever looks at the current step.
    pub fn toggle_checklist_item(&mut self, step_index: usize, item_id: u32) -> Result<(), EngineError> {
        let step = self
            .session
            .steps
            .get_mut(step_index)
            .ok_or(EngineError::StepOutOfRange(step_index))?;
        if !step.toggle_item(item_id) {
            return Err(EngineError::UnknownChecklistItem(item_id));
        }
        self.session.touch();
        self.persist();
        Ok(())
    }

    /// Record a captured photo. It always lands in the session's compliance
    /// record; when the current step demands a photo it also satisfies that
    /// step (a retake replaces the step's reference).
    pub fn record_photo(&mut self, category: PhotoCategory, photo_ref: PhotoRef, notes: Option<String>) {
        self.session
            .compliance_photos
            .push(CompliancePhoto::new(photo_ref.clone(), category, notes));

        let step = self.session.current_step_mut();
        if step.photo_required {
            step.attach_photo(photo_ref);
        }

        self.session.touch();
        self.persist();
    }

    /// Move forward. Refused while the current step is incomplete; from the
    /// final step this lands in the terminal completed state instead of
    /// moving the cursor.
    pub fn advance(&mut self) -> Result<(), EngineError> {
        if !self.session.current_step().completed {
            return Err(EngineError::StepIncomplete);
        }

        if self.session.current_step_index + 1 < self.session.steps.len() {
            self.session.current_step_index += 1;
        } else {
            self.session.status = PackoutStatus::Completed;
            if self.session.completed_at.is_none() {
                self.session.completed_at = Some(chrono::Utc::now());
                info!(order_id = self.session.order_id, "packout workflow complete");
            }
        }

        self.session.touch();
        self.persist();
        Ok(())
    }

    /// Move backward. Never gated on completion; from the terminal state this
    /// reopens the final step.
    pub fn retreat(&mut self) -> Result<(), EngineError> {
        if self.session.status == PackoutStatus::Completed {
            self.session.status = PackoutStatus::InProgress;
            self.session.completed_at = None;
        } else if self.session.current_step_index == 0 {
            return Err(EngineError::AtFirstStep);
        } else {
            self.session.current_step_index -= 1;
        }

        self.session.touch();
        self.persist();
        Ok(())
    }

    /// Submit the finished workflow. On delivery the persisted session is
    /// deleted. On any delivery failure the payload is queued for offline
    /// replay, the persisted session is left intact, and the caller gets
    /// `SavedOffline` rather than an error.
    pub async fn submit(
        &mut self,
        backend: &dyn PackoutBackend,
        outbox: &OfflineOutbox,
    ) -> Result<SubmitOutcome, EngineError> {
        if self.session.status != PackoutStatus::Completed {
            return Err(EngineError::NotReadyToSubmit);
        }

        let report = CompletionReport::from_session(&self.session);
        let payload = serde_json::to_value(&report).map_err(StoreError::Json)?;

        match backend.deliver_completion(&payload).await {
            Ok(()) => {
                info!(
                    order_id = self.session.order_id,
                    submission_id = %report.submission_id,
                    "packout completion delivered"
                );
                if let Err(e) = self.kv.remove(&session_key(self.session.order_id)) {
                    warn!(
                        order_id = self.session.order_id,
                        error = %e,
                        "delivered but could not delete persisted session"
                    );
                }
                Ok(SubmitOutcome::Delivered)
            }
            Err(e) => {
                warn!(
                    order_id = self.session.order_id,
                    error = %e,
                    "completion delivery failed, saving for offline replay"
                );
                let key = outbox.replace_completion(self.session.order_id, payload)?;
                Ok(SubmitOutcome::SavedOffline { key })
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self
            .kv
            .set_json(&session_key(self.session.order_id), &self.session)
        {
            warn!(
                order_id = self.session.order_id,
                error = %e,
                "failed to persist packout session, continuing in memory"
            );
        }
    }
}
