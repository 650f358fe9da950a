use chrono::Utc;
use serde_json::{json, Map, Value};

use super::{require_text, write_failed};
use crate::{
    error::ScreenError,
    models::{Photo, PhotoRow},
    session::ScreenContext,
    sync::{Collection, SortOrder},
    tables::{Filter, Select},
    upload::{upload_with_metadata, SelectedFile, Upload, UploadError},
};

pub const OWNER_COLUMN: &str = "user_id";

pub const REVIEWS_UNAVAILABLE: &str = "Reviews are not available for this activity.";

/// Child table holding reviews of a gallery's images.
#[derive(Debug)]
pub struct ReviewTable {
    pub table: &'static str,
    pub parent_column: &'static str,
}

/// An image collection: its metadata table, the bucket holding the files
/// and, for review galleries, where reviews live.
#[derive(Debug)]
pub struct GalleryKind {
    pub label: &'static str,
    pub table: &'static str,
    pub bucket: &'static str,
    pub reviews: Option<ReviewTable>,
}

pub static DRIVE: GalleryKind = GalleryKind {
    label: "photo drive",
    table: "photos",
    bucket: "photos",
    reviews: None,
};

pub static FOOD_REVIEW: GalleryKind = GalleryKind {
    label: "food review",
    table: "photos_table",
    bucket: "photos_table",
    reviews: Some(ReviewTable {
        table: "reviews",
        parent_column: "photo_id",
    }),
};

pub static POKEMON_REVIEW: GalleryKind = GalleryKind {
    label: "pokemon review",
    table: "pokemons_table",
    bucket: "pokemons_table",
    reviews: Some(ReviewTable {
        table: "pokemons_reviews",
        parent_column: "pokemon_id",
    }),
};

pub static GALLERIES: [&GalleryKind; 3] = [&DRIVE, &FOOD_REVIEW, &POKEMON_REVIEW];

pub struct GalleryScreen {
    ctx: ScreenContext,
    kind: &'static GalleryKind,
    sort: SortOrder,
    photos: Collection<Photo>,
}

impl GalleryScreen {
    pub fn new(ctx: ScreenContext, kind: &'static GalleryKind) -> Self {
        Self {
            ctx,
            kind,
            sort: SortOrder::default(),
            photos: Collection::default(),
        }
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn kind(&self) -> &'static GalleryKind {
        self.kind
    }

    pub fn photos(&self) -> &[Photo] {
        self.photos.items()
    }

    pub fn into_photos(self) -> Vec<Photo> {
        self.photos.into_items()
    }

    pub fn is_fresh(&self) -> bool {
        self.photos.is_fresh()
    }

    /// Case-insensitive name match over the synced list; a blank query
    /// matches everything.
    pub fn search(&self, query: &str) -> Vec<&Photo> {
        let needle = query.trim().to_lowercase();
        self.photos
            .items()
            .iter()
            .filter(|photo| needle.is_empty() || photo.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub async fn sync(&mut self) {
        let Some(session) = self.ctx.session() else {
            return;
        };
        let query = Select::table(self.kind.table)
            .filter(OWNER_COLUMN, session.identity.email.as_str())
            .order(self.sort.key.column(), self.sort.direction);
        let backend = self.ctx.backend();
        let bucket = self.kind.bucket;

        self.photos
            .sync(
                backend.tables.as_ref(),
                &session.access_token,
                &query,
                |row: PhotoRow| Photo {
                    url: backend.public_url(bucket, &row.url),
                    id: row.id,
                    name: row.name,
                    path: row.url,
                    upload_date: row.upload_date,
                },
            )
            .await;
    }

    pub async fn sort_by(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.sync().await;
    }

    pub async fn upload(
        &mut self,
        file: Option<SelectedFile>,
        name: Option<&str>,
    ) -> Result<(), ScreenError> {
        let file = file
            .filter(SelectedFile::is_selected)
            .ok_or(ScreenError::Validation("No file selected."))?;
        let session = self.ctx.require_session()?;
        let backend = self.ctx.backend();

        let upload = Upload {
            bucket: self.kind.bucket,
            table: self.kind.table,
            owner: &session.identity.email,
            name,
            file,
        };
        upload_with_metadata(
            backend.tables.as_ref(),
            backend.storage.as_ref(),
            &session.access_token,
            upload,
            Utc::now().timestamp_millis(),
        )
        .await
        .map_err(|err| {
            let alert = match &err {
                UploadError::Storage(_) => "File upload failed",
                UploadError::Metadata { .. } => "Error inserting photo metadata",
            };
            ScreenError::write(alert, err)
        })?;

        self.sync().await;
        Ok(())
    }

    pub async fn rename(&mut self, id: i64, name: &str) -> Result<(), ScreenError> {
        let name = require_text(name, "Please enter a name.")?;
        let session = self.ctx.require_session()?;
        let table = self.kind.table;

        self.ctx
            .backend()
            .tables
            .update(
                &session.access_token,
                table,
                &Filter::id(id),
                json!({ "name": name }),
            )
            .await
            .map_err(|err| write_failed("Error updating photo name", table, err))?;

        self.sync().await;
        Ok(())
    }

    /// Removes the metadata row only; the stored object is left for
    /// reconciliation.
    pub async fn delete(&mut self, id: i64) -> Result<(), ScreenError> {
        let session = self.ctx.require_session()?;
        let table = self.kind.table;

        self.ctx
            .backend()
            .tables
            .delete(&session.access_token, table, &Filter::id(id))
            .await
            .map_err(|err| write_failed("Error deleting photo", table, err))?;

        self.sync().await;
        Ok(())
    }

    pub async fn add_review(&mut self, parent_id: i64, text: &str) -> Result<(), ScreenError> {
        let reviews = self
            .kind
            .reviews
            .as_ref()
            .ok_or(ScreenError::Validation(REVIEWS_UNAVAILABLE))?;
        let text = require_text(text, "Please enter a review.")?;
        let session = self.ctx.require_session()?;

        let mut row = Map::new();
        row.insert("review".into(), Value::from(text));
        row.insert(reviews.parent_column.into(), Value::from(parent_id));
        row.insert(
            OWNER_COLUMN.into(),
            Value::from(session.identity.email.as_str()),
        );

        self.ctx
            .backend()
            .tables
            .insert(&session.access_token, reviews.table, vec![Value::Object(row)])
            .await
            .map_err(|err| write_failed("Error adding review", reviews.table, err))?;

        self.sync().await;
        Ok(())
    }
}
