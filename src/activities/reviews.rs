use serde_json::json;

use super::{
    gallery::{GalleryKind, ReviewTable, OWNER_COLUMN, REVIEWS_UNAVAILABLE},
    require_text, write_failed,
};
use crate::{
    error::ScreenError,
    models::{Review, ReviewRow},
    session::ScreenContext,
    sync::Collection,
    tables::{Filter, Select, SortDirection},
};

/// "All reviews" screen of a review gallery, newest first, each review
/// joined with the image it refers to.
pub struct ReviewsScreen {
    ctx: ScreenContext,
    kind: &'static GalleryKind,
    table: &'static ReviewTable,
    reviews: Collection<Review>,
}

impl ReviewsScreen {
    pub fn new(ctx: ScreenContext, kind: &'static GalleryKind) -> Result<Self, ScreenError> {
        let table = kind
            .reviews
            .as_ref()
            .ok_or(ScreenError::Validation(REVIEWS_UNAVAILABLE))?;
        Ok(Self {
            ctx,
            kind,
            table,
            reviews: Collection::default(),
        })
    }

    pub fn reviews(&self) -> &[Review] {
        self.reviews.items()
    }

    pub fn into_reviews(self) -> Vec<Review> {
        self.reviews.into_items()
    }

    pub fn is_fresh(&self) -> bool {
        self.reviews.is_fresh()
    }

    pub async fn sync(&mut self) {
        let Some(session) = self.ctx.session() else {
            return;
        };
        let query = Select::table(self.table.table)
            .filter(OWNER_COLUMN, session.identity.email.as_str())
            .embed(self.kind.table, self.table.parent_column, &["name", "url"])
            .order("created_at", SortDirection::Desc);
        let backend = self.ctx.backend();
        let bucket = self.kind.bucket;

        self.reviews
            .sync(
                backend.tables.as_ref(),
                &session.access_token,
                &query,
                |row: ReviewRow| {
                    let (parent_name, parent_url) = match row.parent {
                        Some(parent) => {
                            let url = backend.public_url(bucket, &parent.url);
                            (Some(parent.name), Some(url))
                        }
                        None => (None, None),
                    };
                    Review {
                        id: row.id,
                        review: row.review,
                        parent_id: row.parent_id,
                        created_at: row.created_at,
                        parent_name,
                        parent_url,
                    }
                },
            )
            .await;
    }

    pub async fn edit(&mut self, id: i64, text: &str) -> Result<(), ScreenError> {
        let text = require_text(text, "Please enter a review.")?;
        let session = self.ctx.require_session()?;
        let table = self.table.table;

        self.ctx
            .backend()
            .tables
            .update(
                &session.access_token,
                table,
                &Filter::id(id),
                json!({ "review": text }),
            )
            .await
            .map_err(|err| write_failed("Error updating review", table, err))?;

        self.sync().await;
        Ok(())
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ScreenError> {
        let session = self.ctx.require_session()?;
        let table = self.table.table;

        self.ctx
            .backend()
            .tables
            .delete(&session.access_token, table, &Filter::id(id))
            .await
            .map_err(|err| write_failed("Error deleting review", table, err))?;

        self.sync().await;
        Ok(())
    }
}
