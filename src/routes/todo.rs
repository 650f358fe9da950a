use axum::{
    extract::Path,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    activities::todo::{PriorityChange, TodoScreen},
    auth::ActiveScreen,
    error::{AppError, AppResult},
    models::{Priority, Todo},
    utils::json::{classify_nullable, NullableValue},
};

use super::listing::Listing;

const LOAD_ALERT: &str = "Error loading todos";

#[derive(Deserialize)]
pub struct CreateTodoRequest {
    pub task: String,
    pub priority: Option<Priority>,
}

fn parse_priority(value: &str) -> AppResult<Priority> {
    serde_json::from_value(Value::from(value))
        .map_err(|_| AppError::bad_request("priority must be one of low, medium, high"))
}

fn written(status: StatusCode, screen: TodoScreen) -> Listing<Todo> {
    let fresh = screen.is_fresh();
    Listing::written(status, screen.into_todos(), fresh)
}

pub async fn list_todos(ActiveScreen(screen): ActiveScreen) -> Listing<Todo> {
    let mut screen = TodoScreen::new(screen);
    screen.sync().await;
    let fresh = screen.is_fresh();
    Listing::read(screen.into_todos(), fresh, LOAD_ALERT)
}

pub async fn create_todo(
    ActiveScreen(screen): ActiveScreen,
    Json(payload): Json<CreateTodoRequest>,
) -> AppResult<Listing<Todo>> {
    let mut screen = TodoScreen::new(screen);
    screen.add(&payload.task, payload.priority).await?;
    Ok(written(StatusCode::CREATED, screen))
}

/// `priority` may be omitted (kept), `null` (cleared) or a level.
pub async fn update_todo(
    ActiveScreen(screen): ActiveScreen,
    Path(todo_id): Path<i64>,
    Json(body): Json<Value>,
) -> AppResult<Listing<Todo>> {
    let task = match body.get("task") {
        Some(Value::String(task)) => task.as_str(),
        Some(_) => return Err(AppError::bad_request("task must be a string")),
        None => "",
    };
    let priority = match classify_nullable(body.get("priority")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => PriorityChange::Keep,
        NullableValue::Null => PriorityChange::Clear,
        NullableValue::String(value) if value.is_empty() => PriorityChange::Clear,
        NullableValue::String(value) => PriorityChange::Set(parse_priority(&value)?),
    };

    let mut screen = TodoScreen::new(screen);
    screen.update(todo_id, task, priority).await?;
    Ok(written(StatusCode::OK, screen))
}

pub async fn delete_todo(
    ActiveScreen(screen): ActiveScreen,
    Path(todo_id): Path<i64>,
) -> AppResult<Listing<Todo>> {
    let mut screen = TodoScreen::new(screen);
    screen.delete(todo_id).await?;
    Ok(written(StatusCode::OK, screen))
}
