pub mod api;
pub mod app;
pub mod auth;
pub mod capture;
pub mod config;
pub mod data;
pub mod orders;
pub mod packout;
pub mod sync;
pub mod util;

pub use api::{ApiClient, ApiError, PackoutBackend};
pub use app::{Bootstrap, BootstrapOutcome};
pub use auth::{AuthSession, SessionStore, UserProfile, UserRole};
pub use config::Config;
pub use data::{Database, KvStore, StoreError};
pub use orders::{Order, OrderLookup, Resolution};
pub use packout::{CompletionReport, PackoutEngine, PackoutSession, SubmitOutcome};
pub use sync::{OfflineOutbox, SyncManager};
