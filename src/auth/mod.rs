pub mod gotrue;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::BackendError,
    session::{Phase, ScreenContext, SIGN_IN_ROUTE},
    state::AppState,
};

/// The tenant behind a session. The email scopes every row the user owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub access_token: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("This email is already registered.")]
    AlreadyRegistered,
    #[error("Invalid login credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    /// `Ok(None)` when the token does not (or no longer) identify a user.
    async fn current_session(&self, access_token: &str) -> Result<Option<Session>, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// Bearer token of the request, if any.
pub struct AccessToken(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for AccessToken {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());
        Ok(AccessToken(token))
    }
}

/// A screen context that passed the session guard. Requests without a live
/// session are redirected to the sign-in screen instead of reaching the
/// handler.
pub struct ActiveScreen(pub ScreenContext);

#[async_trait]
impl FromRequestParts<AppState> for ActiveScreen {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AccessToken(token) = match AccessToken::from_request_parts(parts, state).await {
            Ok(token) => token,
            Err(never) => match never {},
        };

        let mut screen = state.screen();
        match screen.activate(state.auth.as_ref(), token.as_deref()).await {
            Phase::Authenticated => Ok(ActiveScreen(screen)),
            _ => Err(Redirect::to(SIGN_IN_ROUTE)),
        }
    }
}

/// The identity behind a guarded request. Rejects the same way as
/// [`ActiveScreen`].
pub struct CurrentIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ActiveScreen(screen) = ActiveScreen::from_request_parts(parts, state).await?;
        screen
            .identity()
            .cloned()
            .map(CurrentIdentity)
            .ok_or_else(|| Redirect::to(SIGN_IN_ROUTE))
    }
}
