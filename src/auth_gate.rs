use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::services::FoodApi;
use crate::session::SessionStore;

/// `Unknown -> (verify) -> Authenticated | Anonymous`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Unknown,
    Authenticated,
    Anonymous,
}

/// Decides whether protected content may be produced. Until a verification
/// has resolved successfully the caller renders the public fallback.
#[derive(Clone)]
pub struct AuthGate {
    status: Arc<Mutex<GateStatus>>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self {
            status: Arc::new(Mutex::new(GateStatus::Unknown)),
        }
    }
}

impl AuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> GateStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, next: GateStatus) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        if *status != next {
            debug!(from = ?*status, to = ?next, "auth gate transition");
            *status = next;
        }
    }

    /// A new identity was set (login); the next guard verifies again.
    pub fn reset(&self) {
        self.set(GateStatus::Unknown);
    }

    pub fn sign_out(&self) {
        self.set(GateStatus::Anonymous);
    }

    /// Returns `true` only when the backend confirmed the session. A failed
    /// check drops the cached identity and keeps the gate closed until
    /// [`AuthGate::reset`].
    pub async fn guard(&self, api: &dyn FoodApi, session: &SessionStore) -> bool {
        if self.status() == GateStatus::Anonymous {
            return false;
        }

        match api.verify_user().await {
            Ok(user) => {
                if let Err(e) = session.set_user(user).await {
                    warn!("Could not persist verified identity: {}", e);
                }
                self.set(GateStatus::Authenticated);
                true
            }
            Err(err) => {
                if err.is_unauthorized() {
                    debug!("session verification failed: {}", err);
                } else {
                    warn!("session could not be verified: {}", err);
                }
                if let Err(e) = session.clear_user().await {
                    warn!("Could not clear cached identity: {}", e);
                }
                self.set(GateStatus::Anonymous);
                false
            }
        }
    }
}
