mod envelope;
mod manager;
mod outbox;

pub use envelope::{completion_key, EnvelopeKind, OfflineEnvelope, OFFLINE_PREFIX};
pub use manager::SyncManager;
pub use outbox::{Delivery, DrainReport, OfflineOutbox};
