//! Backend seam for components that deliver buffered work.
//!
//! The workflow engine and the sync manager talk to the warehouse backend
//! through this trait so tests can substitute a scripted implementation.

use async_trait::async_trait;
use serde_json::Value;

use crate::api::error::ApiError;

#[async_trait]
pub trait PackoutBackend: Send + Sync {
    /// Deliver a packout completion payload to the backend
    async fn deliver_completion(&self, payload: &Value) -> Result<(), ApiError>;

    /// Cheap reachability probe (`GET /health`)
    async fn is_reachable(&self) -> bool;
}
