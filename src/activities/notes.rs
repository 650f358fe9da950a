use serde::Serialize;
use serde_json::json;

use super::{require_text, write_failed};
use crate::{
    error::ScreenError,
    markdown::{render_html, ViewMode},
    models::Note,
    session::ScreenContext,
    sync::Collection,
    tables::{Filter, Select, SortDirection},
};

pub const NOTES_TABLE: &str = "notes";
const OWNER_COLUMN: &str = "user_email";
const MISSING_FIELDS: &str = "Please fill in both title and content.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteView {
    pub id: i64,
    pub title: String,
    pub view: ViewMode,
    pub body: String,
}

pub struct NotesScreen {
    ctx: ScreenContext,
    notes: Collection<Note>,
}

impl NotesScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        Self {
            ctx,
            notes: Collection::default(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        self.notes.items()
    }

    pub fn is_fresh(&self) -> bool {
        self.notes.is_fresh()
    }

    /// The synced notes as the user asked to see them: the Markdown source
    /// or its rendered HTML.
    pub fn view(&self, mode: ViewMode) -> Vec<NoteView> {
        self.notes
            .items()
            .iter()
            .map(|note| NoteView {
                id: note.id,
                title: note.title.clone(),
                view: mode,
                body: match mode {
                    ViewMode::Raw => note.content.clone(),
                    ViewMode::Rendered => render_html(&note.content),
                },
            })
            .collect()
    }

    pub async fn sync(&mut self) {
        let Some(session) = self.ctx.session() else {
            return;
        };
        let query = Select::table(NOTES_TABLE)
            .filter(OWNER_COLUMN, session.identity.email.as_str())
            .order("id", SortDirection::Asc);
        let tables = self.ctx.backend().tables.as_ref();
        self.notes
            .sync(tables, &session.access_token, &query, |note: Note| note)
            .await;
    }

    pub async fn add(&mut self, title: &str, content: &str) -> Result<(), ScreenError> {
        let title = require_text(title, MISSING_FIELDS)?;
        let content = require_text(content, MISSING_FIELDS)?;
        let session = self.ctx.require_session()?;
        let row = json!({
            "title": title,
            "content": content,
            "user_email": session.identity.email,
        });

        self.ctx
            .backend()
            .tables
            .insert(&session.access_token, NOTES_TABLE, vec![row])
            .await
            .map_err(|err| write_failed("Error adding note", NOTES_TABLE, err))?;

        self.sync().await;
        Ok(())
    }

    pub async fn update(&mut self, id: i64, title: &str, content: &str) -> Result<(), ScreenError> {
        let title = require_text(title, MISSING_FIELDS)?;
        let content = require_text(content, MISSING_FIELDS)?;
        let session = self.ctx.require_session()?;

        self.ctx
            .backend()
            .tables
            .update(
                &session.access_token,
                NOTES_TABLE,
                &Filter::id(id),
                json!({ "title": title, "content": content }),
            )
            .await
            .map_err(|err| write_failed("Error updating note", NOTES_TABLE, err))?;

        self.sync().await;
        Ok(())
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ScreenError> {
        let session = self.ctx.require_session()?;

        self.ctx
            .backend()
            .tables
            .delete(&session.access_token, NOTES_TABLE, &Filter::id(id))
            .await
            .map_err(|err| write_failed("Error deleting note", NOTES_TABLE, err))?;

        self.sync().await;
        Ok(())
    }
}
