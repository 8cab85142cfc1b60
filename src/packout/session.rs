//! Persisted packout session state and the completion submission payload.
//!
//! A session is keyed by order id and written back whole after every
//! mutation, so a process restart resumes exactly where the operator left
//! off. The terminal state is part of the record: a session whose final step
//! was advanced past carries `status: completed` until it is submitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::orders::Order;
use crate::packout::photo::{CompliancePhoto, PhotoCategory, PhotoRef};
use crate::packout::step::PackoutStep;
use crate::packout::template;

pub const SESSION_KEY_PREFIX: &str = "packout_";

/// Persistence key for an order's packout session
pub fn session_key(order_id: i64) -> String {
    format!("{SESSION_KEY_PREFIX}{order_id}")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackoutStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackoutSession {
    pub order_id: i64,
    pub order_number: String,
    pub steps: Vec<PackoutStep>,
    pub current_step_index: usize,
    pub compliance_photos: Vec<CompliancePhoto>,
    pub status: PackoutStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl PackoutSession {
    /// Fresh session from the workflow template
    pub fn new(order: &Order) -> Self {
        let now = Utc::now();
        Self {
            order_id: order.id,
            order_number: order.order_number.clone(),
            steps: template::steps_for_order(order),
            current_step_index: 0,
            compliance_photos: Vec::new(),
            status: PackoutStatus::InProgress,
            started_at: now,
            completed_at: None,
            last_updated: now,
        }
    }

    /// A loaded session is usable only when its cursor points at a real step
    pub fn is_well_formed(&self) -> bool {
        !self.steps.is_empty() && self.current_step_index < self.steps.len()
    }

    pub fn current_step(&self) -> &PackoutStep {
        &self.steps[self.current_step_index]
    }

    pub fn current_step_mut(&mut self) -> &mut PackoutStep {
        &mut self.steps[self.current_step_index]
    }

    pub fn is_all_complete(&self) -> bool {
        self.status == PackoutStatus::Completed
    }

    /// (completed steps, total steps)
    pub fn progress(&self) -> (usize, usize) {
        let done = self.steps.iter().filter(|s| s.completed).count();
        (done, self.steps.len())
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

/// One step as reported in the submission payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepRecord {
    pub id: u32,
    pub title: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<PhotoRef>,
}

/// One photo as reported in the submission payload, using the backend's
/// column names rather than the local ones
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoRecord {
    pub file_path: String,
    pub photo_type: PhotoCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Payload POSTed to the completion endpoint.
///
/// `submission_id` is minted once per submission attempt lifecycle and rides
/// along through offline replay, giving the server a dedupe handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionReport {
    pub order_id: i64,
    pub order_number: String,
    pub submission_id: Uuid,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub steps_completed: Vec<StepRecord>,
    pub compliance_photos: Vec<PhotoRecord>,
}

impl CompletionReport {
    pub fn from_session(session: &PackoutSession) -> Self {
        Self {
            order_id: session.order_id,
            order_number: session.order_number.clone(),
            submission_id: Uuid::new_v4(),
            status: "completed".to_string(),
            started_at: session.started_at,
            completed_at: session.completed_at.unwrap_or_else(Utc::now),
            steps_completed: session
                .steps
                .iter()
                .map(|step| StepRecord {
                    id: step.id,
                    title: step.title.clone(),
                    completed: step.completed,
                    photo_ref: step.photo_ref.clone(),
                })
                .collect(),
            compliance_photos: session
                .compliance_photos
                .iter()
                .map(|photo| PhotoRecord {
                    file_path: photo.photo_ref.as_str().to_string(),
                    photo_type: photo.category,
                    notes: photo.notes.clone(),
                    timestamp: photo.captured_at,
                })
                .collect(),
        }
    }
}
