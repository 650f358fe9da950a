use tracing::{info, warn};

use super::write_failed;
use crate::{
    auth::AuthProvider,
    error::ScreenError,
    session::ScreenContext,
    tables::Filter,
};

pub const USERS_TABLE: &str = "users";

pub struct DashboardScreen {
    ctx: ScreenContext,
}

impl DashboardScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ScreenContext {
        &self.ctx
    }

    /// Ends the provider session and leaves the screen. A provider failure is
    /// only logged: the user is signed out locally either way.
    pub async fn sign_out(&mut self, auth: &dyn AuthProvider) {
        if let Some(session) = self.ctx.session() {
            if let Err(err) = auth.sign_out(&session.access_token).await {
                warn!(error = %err, tenant = %session.identity.email, "provider sign-out failed");
            }
        }
        self.ctx.teardown();
    }

    /// Deletes the profile row keyed by the user's email, then signs out.
    pub async fn delete_account(&mut self, auth: &dyn AuthProvider) -> Result<(), ScreenError> {
        let session = self.ctx.require_session()?;

        self.ctx
            .backend()
            .tables
            .delete(
                &session.access_token,
                USERS_TABLE,
                &Filter::eq("email", session.identity.email.as_str()),
            )
            .await
            .map_err(|err| {
                write_failed(
                    "Failed to delete account. Please try again.",
                    USERS_TABLE,
                    err,
                )
            })?;
        info!(tenant = %session.identity.email, "account deleted");

        self.sign_out(auth).await;
        Ok(())
    }
}
