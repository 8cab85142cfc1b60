mod engine;
mod photo;
mod session;
mod step;
mod template;

pub use engine::{EngineError, PackoutEngine, SubmitOutcome};
pub use photo::{CompliancePhoto, PhotoCategory, PhotoRef};
pub use session::{
    session_key, CompletionReport, PackoutSession, PackoutStatus, PhotoRecord, StepRecord,
};
pub use step::{ChecklistItem, PackoutStep};
pub use template::steps_for_order;
