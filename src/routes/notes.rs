use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    activities::notes::{NoteView, NotesScreen},
    auth::ActiveScreen,
    error::AppResult,
    markdown::ViewMode,
};

use super::listing::Listing;

const LOAD_ALERT: &str = "Error loading notes";

#[derive(Deserialize, Default)]
pub struct ViewQuery {
    #[serde(default)]
    pub view: ViewMode,
}

#[derive(Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub view: ViewMode,
}

pub async fn list_notes(
    ActiveScreen(screen): ActiveScreen,
    Query(query): Query<ViewQuery>,
) -> Listing<NoteView> {
    let mut screen = NotesScreen::new(screen);
    screen.sync().await;
    Listing::read(screen.view(query.view), screen.is_fresh(), LOAD_ALERT)
}

pub async fn create_note(
    ActiveScreen(screen): ActiveScreen,
    Json(payload): Json<NoteRequest>,
) -> AppResult<Listing<NoteView>> {
    let mut screen = NotesScreen::new(screen);
    screen.add(&payload.title, &payload.content).await?;
    Ok(Listing::written(
        StatusCode::CREATED,
        screen.view(payload.view),
        screen.is_fresh(),
    ))
}

pub async fn update_note(
    ActiveScreen(screen): ActiveScreen,
    Path(note_id): Path<i64>,
    Json(payload): Json<NoteRequest>,
) -> AppResult<Listing<NoteView>> {
    let mut screen = NotesScreen::new(screen);
    screen
        .update(note_id, &payload.title, &payload.content)
        .await?;
    Ok(Listing::written(
        StatusCode::OK,
        screen.view(payload.view),
        screen.is_fresh(),
    ))
}

pub async fn delete_note(
    ActiveScreen(screen): ActiveScreen,
    Path(note_id): Path<i64>,
    Query(query): Query<ViewQuery>,
) -> AppResult<Listing<NoteView>> {
    let mut screen = NotesScreen::new(screen);
    screen.delete(note_id).await?;
    Ok(Listing::written(
        StatusCode::OK,
        screen.view(query.view),
        screen.is_fresh(),
    ))
}
