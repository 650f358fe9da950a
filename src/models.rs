use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub task: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub user_email: String,
}

/// Metadata row of an uploaded image. `url` holds the path relative to the
/// bucket, never an absolute URL.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoRow {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: String,
    #[serde(default)]
    pub upload_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub url: String,
    pub upload_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParentRef {
    pub name: String,
    pub url: String,
}

/// A review row, optionally carrying its embedded parent image.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewRow {
    pub id: i64,
    pub review: String,
    #[serde(alias = "photo_id", alias = "pokemon_id")]
    pub parent_id: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "photos_table", alias = "pokemons_table")]
    pub parent: Option<ParentRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: i64,
    pub review: String,
    pub parent_id: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub parent_name: Option<String>,
    pub parent_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_email: String,
}
