//! Compliance photo records and categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque handle to a captured photo (a file path in this deployment)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoRef {
    fn from(value: &str) -> Self {
        PhotoRef(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PhotoCategory {
    Package,
    Label,
    Damage,
    Compliance,
    #[default]
    General,
}

impl PhotoCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoCategory::Package => "package",
            PhotoCategory::Label => "label",
            PhotoCategory::Damage => "damage",
            PhotoCategory::Compliance => "compliance",
            PhotoCategory::General => "general",
        }
    }

    /// Parse an operator-supplied category name
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "package" => Some(PhotoCategory::Package),
            "label" => Some(PhotoCategory::Label),
            "damage" => Some(PhotoCategory::Damage),
            "compliance" => Some(PhotoCategory::Compliance),
            "general" => Some(PhotoCategory::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for PhotoCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit evidence attached to a packout session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompliancePhoto {
    pub photo_ref: PhotoRef,
    pub category: PhotoCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl CompliancePhoto {
    pub fn new(photo_ref: PhotoRef, category: PhotoCategory, notes: Option<String>) -> Self {
        Self {
            photo_ref,
            category,
            notes,
            captured_at: Utc::now(),
        }
    }
}
