//! App-session bootstrap: restore, validate, then opportunistically drain.
//!
//! The stored credential is never trusted on its own. It is presented to the
//! backend first; an explicit rejection signs the operator out, while an
//! unreachable backend falls back to the stored session so warehouse work
//! can continue offline. Draining the outbox rides on a validated entry and
//! never fails the bootstrap.

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{SessionStore, UserProfile};
use crate::sync::SyncManager;

#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    NotAuthenticated,
    Authenticated {
        profile: Option<UserProfile>,
        /// False when the backend could not be reached to confirm the token
        validated: bool,
    },
}

impl BootstrapOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, BootstrapOutcome::Authenticated { .. })
    }
}

pub struct Bootstrap {
    session: SessionStore,
    client: ApiClient,
    sync: SyncManager,
}

impl Bootstrap {
    pub fn new(session: SessionStore, client: ApiClient, sync: SyncManager) -> Self {
        Self {
            session,
            client,
            sync,
        }
    }

    pub async fn run(&self) -> BootstrapOutcome {
        if self.session.current().is_none() {
            debug!("no stored session");
            return BootstrapOutcome::NotAuthenticated;
        }

        match self.client.me().await {
            Ok(profile) => {
                self.session.set_profile(&profile);
                if let Err(e) = self.sync.sync_now().await {
                    warn!(error = %e, "post-bootstrap sync failed");
                }
                BootstrapOutcome::Authenticated {
                    profile: Some(profile),
                    validated: true,
                }
            }
            Err(ApiError::AuthRejected) => {
                // the response classifier has already cleared the session
                info!("stored session rejected by backend, signed out");
                BootstrapOutcome::NotAuthenticated
            }
            Err(ApiError::Unavailable(reason)) => {
                debug!(reason, "backend unreachable, entering offline with stored session");
                BootstrapOutcome::Authenticated {
                    profile: self.session.profile(),
                    validated: false,
                }
            }
            Err(e) => {
                warn!(error = %e, "profile validation failed, continuing unvalidated");
                BootstrapOutcome::Authenticated {
                    profile: self.session.profile(),
                    validated: false,
                }
            }
        }
    }
}
