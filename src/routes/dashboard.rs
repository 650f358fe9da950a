use axum::{extract::State, http::StatusCode, Json};

use crate::{
    activities::dashboard::DashboardScreen,
    auth::{ActiveScreen, CurrentIdentity, Identity},
    error::AppResult,
    state::AppState,
};

pub async fn show(CurrentIdentity(identity): CurrentIdentity) -> Json<Identity> {
    Json(identity)
}

pub async fn delete_account(
    State(state): State<AppState>,
    ActiveScreen(screen): ActiveScreen,
) -> AppResult<StatusCode> {
    let mut screen = DashboardScreen::new(screen);
    screen.delete_account(state.auth.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
