//! API error taxonomy.
//!
//! One classifier maps every backend response onto these variants; callers
//! never inspect raw status codes. For mutating calls every variant is a
//! delivery failure and routes to the offline outbox; only `AuthRejected`
//! additionally forces re-authentication.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server rejected the credential (HTTP 401). The session store is
    /// cleared by the classifier before this is returned.
    #[error("credential rejected by server")]
    AuthRejected,

    /// No response reached the server (connect error, timeout, DNS)
    #[error("server unreachable: {0}")]
    Unavailable(String),

    /// The server answered with a non-2xx status other than 401
    #[error("server returned {status}")]
    Http { status: StatusCode },

    /// The response body could not be decoded
    #[error("invalid response payload: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when the failure means the request may simply be retried later
    /// without operator involvement
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ApiError::Unavailable(_))
    }
}
