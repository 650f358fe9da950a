use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    auth::AccessToken,
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SignUpResponse {
    pub email: String,
    pub next: &'static str,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub token_type: String,
    pub email: String,
}

fn validate(payload: &CredentialsRequest) -> AppResult<&str> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("email and password are required"));
    }
    Ok(email)
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<SignUpResponse>)> {
    let email = validate(&payload)?;

    state.auth.sign_up(email, &payload.password).await?;
    info!(email, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            email: email.to_string(),
            next: "/auth/signin",
        }),
    ))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> AppResult<Json<SignInResponse>> {
    let email = validate(&payload)?;

    let session = state.auth.sign_in(email, &payload.password).await?;

    Ok(Json(SignInResponse {
        access_token: session.access_token,
        token_type: "Bearer".to_string(),
        email: session.identity.email,
    }))
}

/// Always succeeds from the caller's point of view.
pub async fn sign_out(State(state): State<AppState>, AccessToken(token): AccessToken) -> StatusCode {
    if let Some(token) = token {
        if let Err(err) = state.auth.sign_out(&token).await {
            warn!(error = %err, "provider sign-out failed");
        }
    }
    StatusCode::NO_CONTENT
}
