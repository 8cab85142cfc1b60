//! Packing steps and their completion rule.
//!
//! A step is complete exactly when its photo obligation is satisfied and
//! every checklist item is ticked. The flag is stored for display and
//! persistence but is always recomputed after a mutation, never edited
//! directly.

use serde::{Deserialize, Serialize};

use crate::packout::photo::PhotoRef;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItem {
    pub id: u32,
    pub text: String,
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
        }
    }
}

/// One step of the packing workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackoutStep {
    /// Stable 1-based id
    pub id: u32,
    pub title: String,
    pub description: String,
    pub required: bool,
    pub photo_required: bool,
    pub instructions: Vec<String>,
    pub checklist: Vec<ChecklistItem>,
    pub photo_taken: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_ref: Option<PhotoRef>,
    pub completed: bool,
}

impl PackoutStep {
    /// The completion rule: photo satisfied (when demanded) and every
    /// checklist item ticked. Pure; reads nothing but the step itself.
    pub fn compute_completed(&self) -> bool {
        (!self.photo_required || self.photo_taken)
            && self.checklist.iter().all(|item| item.completed)
    }

    pub fn recompute(&mut self) {
        self.completed = self.compute_completed();
    }

    /// Flip one checklist item by id. Returns false when no item has that id.
    pub fn toggle_item(&mut self, item_id: u32) -> bool {
        let Some(item) = self.checklist.iter_mut().find(|item| item.id == item_id) else {
            return false;
        };
        item.completed = !item.completed;
        self.recompute();
        true
    }

    /// Record a captured photo against this step
    pub fn attach_photo(&mut self, photo_ref: PhotoRef) {
        self.photo_taken = true;
        self.photo_ref = Some(photo_ref);
        self.recompute();
    }

    /// (ticked, total) for progress display
    pub fn checklist_progress(&self) -> (usize, usize) {
        let done = self.checklist.iter().filter(|item| item.completed).count();
        (done, self.checklist.len())
    }
}
