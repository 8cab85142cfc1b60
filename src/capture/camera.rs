//! Photo capture seam.
//!
//! The workflow engine only ever sees an opaque [`PhotoRef`]; where the bytes
//! come from is behind this trait. The console build resolves a file the
//! operator already has on disk.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::packout::{PhotoCategory, PhotoRef};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture cancelled by operator")]
    Cancelled,
    #[error("capture failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait Camera: Send + Sync {
    /// Produce one photo. `hint` tells the device what the shot is for so a
    /// richer implementation can adjust framing or overlays.
    async fn capture(&self, hint: PhotoCategory) -> Result<PhotoRef, CaptureError>;
}

/// Camera that resolves an existing file supplied by the operator
pub struct PathCamera {
    path: PathBuf,
}

impl PathCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Camera for PathCamera {
    async fn capture(&self, hint: PhotoCategory) -> Result<PhotoRef, CaptureError> {
        let resolved = tokio::fs::canonicalize(&self.path)
            .await
            .map_err(|e| CaptureError::Failed(format!("{}: {e}", self.path.display())))?;
        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| CaptureError::Failed(format!("{}: {e}", resolved.display())))?;
        if !meta.is_file() {
            return Err(CaptureError::Failed(format!(
                "{} is not a file",
                resolved.display()
            )));
        }
        debug!(path = %resolved.display(), category = %hint, "photo resolved");
        Ok(PhotoRef(resolved.display().to_string()))
    }
}
