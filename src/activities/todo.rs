use serde_json::{json, Map, Value};

use super::{require_text, write_failed};
use crate::{
    error::ScreenError,
    models::{Priority, Todo},
    session::ScreenContext,
    sync::Collection,
    tables::{Filter, Select, SortDirection},
};

pub const TODOS_TABLE: &str = "todos";
const OWNER_COLUMN: &str = "user_email";

/// What an edit does to the optional priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityChange {
    Keep,
    Clear,
    Set(Priority),
}

pub struct TodoScreen {
    ctx: ScreenContext,
    todos: Collection<Todo>,
}

impl TodoScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            todos: Collection::default(),
        }
    }

    pub fn context_mut(&mut self) -> &mut ScreenContext {
        &mut self.ctx
    }

    pub fn todos(&self) -> &[Todo] {
        self.todos.items()
    }

    pub fn into_todos(self) -> Vec<Todo> {
        self.todos.into_items()
    }

    pub fn is_fresh(&self) -> bool {
        self.todos.is_fresh()
    }

    pub async fn sync(&mut self) {
        let Some(session) = self.ctx.session() else {
            return;
        };
        let query = Select::table(TODOS_TABLE)
            .filter(OWNER_COLUMN, session.identity.email.as_str())
            .order("id", SortDirection::Asc);
        let tables = self.ctx.backend().tables.as_ref();
        self.todos
            .sync(tables, &session.access_token, &query, |todo: Todo| todo)
            .await;
    }

    pub async fn add(&mut self, task: &str, priority: Option<Priority>) -> Result<(), ScreenError> {
        let task = require_text(task, "Please enter a task.")?;
        let session = self.ctx.require_session()?;
        let row = json!({
            "task": task,
            "priority": priority,
            "user_email": session.identity.email,
        });

        self.ctx
            .backend()
            .tables
            .insert(&session.access_token, TODOS_TABLE, vec![row])
            .await
            .map_err(|err| write_failed("Error adding todo", TODOS_TABLE, err))?;

        self.sync().await;
        Ok(())
    }

    pub async fn update(
        &mut self,
        id: i64,
        task: &str,
        priority: PriorityChange,
    ) -> Result<(), ScreenError> {
        let task = require_text(task, "Please enter a task.")?;
        let session = self.ctx.require_session()?;

        let mut patch = Map::new();
        patch.insert("task".into(), Value::from(task));
        match priority {
            PriorityChange::Keep => {}
            PriorityChange::Clear => {
                patch.insert("priority".into(), Value::Null);
            }
            PriorityChange::Set(priority) => {
                patch.insert("priority".into(), json!(priority));
            }
        }

        self.ctx
            .backend()
            .tables
            .update(
                &session.access_token,
                TODOS_TABLE,
                &Filter::id(id),
                Value::Object(patch),
            )
            .await
            .map_err(|err| write_failed("Error updating todo", TODOS_TABLE, err))?;

        self.sync().await;
        Ok(())
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ScreenError> {
        let session = self.ctx.require_session()?;

        self.ctx
            .backend()
            .tables
            .delete(&session.access_token, TODOS_TABLE, &Filter::id(id))
            .await
            .map_err(|err| write_failed("Error deleting todo", TODOS_TABLE, err))?;

        self.sync().await;
        Ok(())
    }
}
