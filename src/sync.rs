use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, warn};

use crate::tables::{fetch, Select, SortDirection, TableStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    UploadDate,
}

impl SortKey {
    pub fn column(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::UploadDate => "upload_date",
        }
    }
}

/// Field and direction are chosen independently; the default is name,
/// ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

/// A screen's working list, replaced wholesale by each successful sync.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    fresh: bool,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            fresh: false,
        }
    }
}

impl<T> Collection<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the most recent sync succeeded. False before the first sync
    /// and after a failed one, when the list may not reflect the backend.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Fetches `query`, maps each row through `project` and replaces the
    /// list. A failed read is logged and leaves the previous list in place;
    /// returns whether the list was replaced.
    pub async fn sync<R, F>(
        &mut self,
        tables: &dyn TableStore,
        token: &str,
        query: &Select,
        project: F,
    ) -> bool
    where
        R: DeserializeOwned,
        F: FnMut(R) -> T,
    {
        match fetch::<R>(tables, token, query).await {
            Ok(rows) => {
                self.items = rows.into_iter().map(project).collect();
                self.fresh = true;
                debug!(table = %query.table, rows = self.items.len(), "collection synced");
                true
            }
            Err(err) => {
                self.fresh = false;
                warn!(
                    table = %query.table,
                    error = %err,
                    "collection sync failed; keeping previous list"
                );
                false
            }
        }
    }
}
