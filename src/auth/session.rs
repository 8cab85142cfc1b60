//! Authentication session and principal models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer credential issued by the backend's login endpoint.
///
/// The token itself is opaque; nothing in the client inspects it beyond
/// attaching it to outbound requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    /// Token scheme as reported by the server (always "bearer" today)
    pub token_type: String,
    /// Issued lifetime in seconds
    pub expires_in: i64,
    /// Username the token was issued for, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl AuthSession {
    /// Value for the Authorization header
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Worker role as assigned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Supervisor,
    Worker,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Supervisor => "supervisor",
            UserRole::Worker => "worker",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Principal profile returned by `GET /auth/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
