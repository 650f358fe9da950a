//! Routes shared by the three image activities. Each gallery is mounted
//! under its own prefix with its [`GalleryKind`] baked into the handlers.

use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::error;

use crate::{
    activities::{
        gallery::{GalleryKind, GalleryScreen},
        reviews::ReviewsScreen,
    },
    auth::ActiveScreen,
    error::{AppError, AppResult},
    models::{Photo, Review},
    state::AppState,
    sync::{SortKey, SortOrder},
    tables::SortDirection,
    upload::SelectedFile,
};

use super::listing::Listing;

const PHOTOS_ALERT: &str = "Error loading photos";
const REVIEWS_ALERT: &str = "Error loading reviews";

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<SortKey>,
    pub direction: Option<SortDirection>,
    pub q: Option<String>,
}

impl ListQuery {
    fn order(&self) -> SortOrder {
        SortOrder::new(
            self.sort.unwrap_or_default(),
            self.direction.unwrap_or_default(),
        )
    }
}

#[derive(Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub review: String,
}

pub fn routes(kind: &'static GalleryKind) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(move |screen: ActiveScreen, Query(query): Query<ListQuery>| {
                list_photos(kind, screen, query)
            })
            .post(
                move |screen: ActiveScreen, Query(query): Query<ListQuery>, multipart: Multipart| {
                    upload_photo(kind, screen, query, multipart)
                },
            ),
        )
        .route(
            "/:id",
            patch(
                move |screen: ActiveScreen,
                      Path(id): Path<i64>,
                      Query(query): Query<ListQuery>,
                      Json(payload): Json<RenameRequest>| {
                    rename_photo(kind, screen, id, query, payload)
                },
            )
            .delete(
                move |screen: ActiveScreen, Path(id): Path<i64>, Query(query): Query<ListQuery>| {
                    delete_photo(kind, screen, id, query)
                },
            ),
        )
        .route(
            "/:id/reviews",
            post(
                move |screen: ActiveScreen,
                      Path(id): Path<i64>,
                      Query(query): Query<ListQuery>,
                      Json(payload): Json<ReviewRequest>| {
                    add_review(kind, screen, id, query, payload)
                },
            ),
        )
        .route(
            "/reviews",
            get(move |screen: ActiveScreen| list_reviews(kind, screen)),
        )
        .route(
            "/reviews/:id",
            patch(
                move |screen: ActiveScreen, Path(id): Path<i64>, Json(payload): Json<ReviewRequest>| {
                    edit_review(kind, screen, id, payload)
                },
            )
            .delete(move |screen: ActiveScreen, Path(id): Path<i64>| {
                delete_review(kind, screen, id)
            }),
        )
}

fn visible(screen: &GalleryScreen, query: &ListQuery) -> Vec<Photo> {
    match query.q.as_deref() {
        Some(needle) => screen.search(needle).into_iter().cloned().collect(),
        None => screen.photos().to_vec(),
    }
}

fn written(status: StatusCode, screen: &GalleryScreen, query: &ListQuery) -> Listing<Photo> {
    Listing::written(status, visible(screen, query), screen.is_fresh())
}

fn written_reviews(status: StatusCode, screen: ReviewsScreen) -> Listing<Review> {
    let fresh = screen.is_fresh();
    Listing::written(status, screen.into_reviews(), fresh)
}

async fn list_photos(
    kind: &'static GalleryKind,
    ActiveScreen(ctx): ActiveScreen,
    query: ListQuery,
) -> Listing<Photo> {
    let mut screen = GalleryScreen::new(ctx, kind).with_sort(query.order());
    screen.sync().await;
    Listing::read(visible(&screen, &query), screen.is_fresh(), PHOTOS_ALERT)
}

async fn upload_photo(
    kind: &'static GalleryKind,
    ActiveScreen(ctx): ActiveScreen,
    query: ListQuery,
    mut multipart: Multipart,
) -> AppResult<Listing<Photo>> {
    let mut file: Option<SelectedFile> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!(error = %err, gallery = kind.label, "invalid multipart data");
        AppError::bad_request(format!("invalid multipart data: {err}"))
    })? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|err| {
                    error!(error = %err, gallery = kind.label, "failed to read file bytes");
                    AppError::bad_request(format!("failed to read file bytes: {err}"))
                })?;
                file = Some(SelectedFile {
                    filename,
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            Some("name") => {
                let value = field.text().await.map_err(|err| {
                    AppError::bad_request(format!("invalid name field: {err}"))
                })?;
                name = Some(value);
            }
            _ => {}
        }
    }

    let mut screen = GalleryScreen::new(ctx, kind).with_sort(query.order());
    screen.upload(file, name.as_deref()).await?;
    Ok(written(StatusCode::CREATED, &screen, &query))
}

async fn rename_photo(
    kind: &'static GalleryKind,
    ActiveScreen(ctx): ActiveScreen,
    id: i64,
    query: ListQuery,
    payload: RenameRequest,
) -> AppResult<Listing<Photo>> {
    let mut screen = GalleryScreen::new(ctx, kind).with_sort(query.order());
    screen.rename(id, &payload.name).await?;
    Ok(written(StatusCode::OK, &screen, &query))
}

async fn delete_photo(
    kind: &'static GalleryKind,
    ActiveScreen(ctx): ActiveScreen,
    id: i64,
    query: ListQuery,
) -> AppResult<Listing<Photo>> {
    let mut screen = GalleryScreen::new(ctx, kind).with_sort(query.order());
    screen.delete(id).await?;
    Ok(written(StatusCode::OK, &screen, &query))
}

async fn add_review(
    kind: &'static GalleryKind,
    ActiveScreen(ctx): ActiveScreen,
    photo_id: i64,
    query: ListQuery,
    payload: ReviewRequest,
) -> AppResult<Listing<Photo>> {
    let mut screen = GalleryScreen::new(ctx, kind).with_sort(query.order());
    screen.add_review(photo_id, &payload.review).await?;
    Ok(written(StatusCode::CREATED, &screen, &query))
}

async fn list_reviews(
    kind: &'static GalleryKind,
    ActiveScreen(ctx): ActiveScreen,
) -> AppResult<Listing<Review>> {
    let mut screen = ReviewsScreen::new(ctx, kind)?;
    screen.sync().await;
    let fresh = screen.is_fresh();
    Ok(Listing::read(screen.into_reviews(), fresh, REVIEWS_ALERT))
}

async fn edit_review(
    kind: &'static GalleryKind,
    ActiveScreen(ctx): ActiveScreen,
    id: i64,
    payload: ReviewRequest,
) -> AppResult<Listing<Review>> {
    let mut screen = ReviewsScreen::new(ctx, kind)?;
    screen.edit(id, &payload.review).await?;
    Ok(written_reviews(StatusCode::OK, screen))
}

async fn delete_review(
    kind: &'static GalleryKind,
    ActiveScreen(ctx): ActiveScreen,
    id: i64,
) -> AppResult<Listing<Review>> {
    let mut screen = ReviewsScreen::new(ctx, kind)?;
    screen.delete(id).await?;
    Ok(written_reviews(StatusCode::OK, screen))
}

#[cfg(test)]
mod tests {
    use super::ListQuery;
    use crate::{sync::SortKey, tables::SortDirection};

    #[test]
    fn sort_defaults_to_name_ascending() {
        let order = ListQuery::default().order();
        assert_eq!(order.key, SortKey::Name);
        assert_eq!(order.direction, SortDirection::Asc);
    }

    #[test]
    fn direction_is_independent_of_key() {
        let query = ListQuery {
            sort: Some(SortKey::UploadDate),
            direction: None,
            q: None,
        };
        assert_eq!(query.order().direction, SortDirection::Asc);
    }
}
