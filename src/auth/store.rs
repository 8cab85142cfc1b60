//! Durable session store.
//!
//! Holds the active credential and the cached principal profile. Every
//! mutation writes through to the key-value store before returning, and reads
//! always go back to it, so the store can never report a credential that is
//! not actually durable. Persistence failures are logged and swallowed; a
//! read after a failed write sees nothing and the caller treats the worker as
//! signed out.

use tracing::warn;

use crate::auth::session::{AuthSession, UserProfile};
use crate::data::KvStore;

const SESSION_KEY: &str = "session";
const PROFILE_KEY: &str = "session_profile";

/// Store for the active authentication session
#[derive(Clone)]
pub struct SessionStore {
    kv: KvStore,
}

impl SessionStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Persist and activate a credential
    pub fn set(&self, session: &AuthSession) {
        if let Err(e) = self.kv.set_json(SESSION_KEY, session) {
            warn!(error = %e, "Failed to persist session; treating as signed out");
        }
    }

    /// The active credential, if one is durably stored
    pub fn current(&self) -> Option<AuthSession> {
        match self.kv.get_json(SESSION_KEY) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read session; treating as signed out");
                None
            }
        }
    }

    /// Cache the validated principal profile
    pub fn set_profile(&self, profile: &UserProfile) {
        if let Err(e) = self.kv.set_json(PROFILE_KEY, profile) {
            warn!(error = %e, "Failed to persist principal profile");
        }
    }

    /// The cached principal profile, if any
    pub fn profile(&self) -> Option<UserProfile> {
        match self.kv.get_json(PROFILE_KEY) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Failed to read cached profile");
                None
            }
        }
    }

    /// Remove the credential and any cached principal
    pub fn clear(&self) {
        if let Err(e) = self.kv.remove(SESSION_KEY) {
            warn!(error = %e, "Failed to remove session key");
        }
        if let Err(e) = self.kv.remove(PROFILE_KEY) {
            warn!(error = %e, "Failed to remove cached profile");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Authorization header value for the active credential, if any
    pub fn authorization_value(&self) -> Option<String> {
        self.current().map(|s| s.authorization_value())
    }
}
