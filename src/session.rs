//! Per-screen session guard.
//!
//! A [`ScreenContext`] is created when a screen is entered and moves through
//! `Init -> Authenticated | Redirected -> TornDown`. The session is looked up
//! exactly once, on activation; nothing polls or subscribes for changes, so
//! a session that expires mid-use is only noticed on the next activation.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    auth::{AuthProvider, Identity, Session},
    error::ScreenError,
    storage::{public_object_url, ObjectStorage},
    tables::TableStore,
};

pub const SIGN_IN_ROUTE: &str = "/auth";

pub const NOT_SIGNED_IN: &str = "User is not logged in or user email is missing.";

/// Handles to the hosted backend shared by every screen.
#[derive(Clone)]
pub struct Backend {
    pub tables: Arc<dyn TableStore>,
    pub storage: Arc<dyn ObjectStorage>,
    public_base_url: Arc<str>,
}

impl Backend {
    pub fn new(
        tables: Arc<dyn TableStore>,
        storage: Arc<dyn ObjectStorage>,
        public_base_url: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            tables,
            storage,
            public_base_url: public_base_url.into(),
        }
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        public_object_url(&self.public_base_url, bucket, path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Authenticated,
    Redirected,
    TornDown,
}

pub struct ScreenContext {
    backend: Backend,
    session: Option<Session>,
    phase: Phase,
}

impl ScreenContext {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            session: None,
            phase: Phase::Init,
        }
    }

    /// Runs the guard. Only the first call asks the provider; later calls
    /// report the phase already reached.
    pub async fn activate(&mut self, auth: &dyn AuthProvider, access_token: Option<&str>) -> Phase {
        if self.phase != Phase::Init {
            return self.phase;
        }

        let session = match access_token {
            None => None,
            Some(token) => match auth.current_session(token).await {
                Ok(session) => session,
                Err(err) => {
                    warn!(error = %err, "session lookup failed; treating as signed out");
                    None
                }
            },
        };

        match session {
            Some(session) => {
                debug!(tenant = %session.identity.email, "screen activated");
                self.session = Some(session);
                self.phase = Phase::Authenticated;
            }
            None => {
                debug!(redirect = SIGN_IN_ROUTE, "no session; redirecting");
                self.phase = Phase::Redirected;
            }
        }
        self.phase
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn redirect_target(&self) -> Option<&'static str> {
        (self.phase == Phase::Redirected).then_some(SIGN_IN_ROUTE)
    }

    pub fn session(&self) -> Option<&Session> {
        match self.phase {
            Phase::Authenticated => self.session.as_ref(),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session().map(|session| &session.identity)
    }

    pub fn require_session(&self) -> Result<&Session, ScreenError> {
        self.session()
            .filter(|session| !session.identity.email.is_empty())
            .ok_or(ScreenError::Validation(NOT_SIGNED_IN))
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Leaves the screen. The identity is forgotten and further actions are
    /// refused.
    pub fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(tenant = %session.identity.email, "screen torn down");
        }
        self.phase = Phase::TornDown;
    }
}
