use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::activities::gallery::{DRIVE, FOOD_REVIEW, POKEMON_REVIEW};
use crate::state::AppState;

pub mod auth;
pub mod dashboard;
pub mod gallery;
pub mod health;
pub mod listing;
pub mod notes;
pub mod todo;

const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 50;

pub fn create_router(state: AppState) -> Router<()> {
    let allow_origin = match state.config.cors_allowed_origin.as_ref() {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(err) => {
                        warn!(origin = value, error = %err, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
        .allow_credentials(true);

    let auth_routes = Router::new()
        .route("/signup", post(auth::sign_up))
        .route("/signin", post(auth::sign_in))
        .route("/signout", post(auth::sign_out));

    let dashboard_routes = Router::new()
        .route("/", get(dashboard::show))
        .route("/account", delete(dashboard::delete_account));

    let todo_routes = Router::new()
        .route("/", get(todo::list_todos).post(todo::create_todo))
        .route(
            "/:id",
            patch(todo::update_todo).delete(todo::delete_todo),
        );

    let notes_routes = Router::new()
        .route("/", get(notes::list_notes).post(notes::create_note))
        .route(
            "/:id",
            patch(notes::update_note).delete(notes::delete_note),
        );

    let activity_routes = Router::new()
        .nest("/todo", todo_routes)
        .nest("/google_drive", gallery::routes(&DRIVE))
        .nest("/food_review_app", gallery::routes(&FOOD_REVIEW))
        .nest("/pokemon_review_app", gallery::routes(&POKEMON_REVIEW))
        .nest("/mark_down_app", notes_routes);

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/activities", activity_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
