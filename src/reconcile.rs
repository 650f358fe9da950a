use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    activities::gallery::GalleryKind,
    storage::ObjectStorage,
    tables::{fetch, Select, SortDirection, TableStore},
    upload::UPLOAD_PREFIX,
};

/// Rows requested per metadata page.
pub const METADATA_PAGE_SIZE: usize = 1000;

/// Objects at least this old are eligible for deletion. Younger ones may
/// belong to an upload whose metadata insert has not landed yet.
pub const DEFAULT_UPLOAD_GRACE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    pub dry_run: bool,
    /// Only objects last modified before this instant are considered.
    pub cutoff: DateTime<Utc>,
}

impl ReconcileOptions {
    pub fn new(dry_run: bool) -> Self {
        Self::with_grace(dry_run, Duration::minutes(DEFAULT_UPLOAD_GRACE_MINUTES))
    }

    pub fn with_grace(dry_run: bool, grace: Duration) -> Self {
        Self {
            dry_run,
            cutoff: Utc::now() - grace,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub bucket: String,
    pub scanned: usize,
    /// Unreferenced objects skipped because they are inside the grace period.
    pub recent: usize,
    pub orphaned: Vec<String>,
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Deserialize)]
struct PathRow {
    url: String,
}

/// Every path referenced by `table`, read page by page in id order. A page
/// shorter than requested does not end the scan, since the backend may cap
/// page sizes; only an empty page does.
async fn referenced_paths(
    tables: &dyn TableStore,
    service_token: &str,
    table: &str,
) -> Result<HashSet<String>> {
    let mut paths = HashSet::new();
    let mut offset = 0;

    loop {
        let query = Select::table(table)
            .order("id", SortDirection::Asc)
            .page(offset, METADATA_PAGE_SIZE);
        let rows = fetch::<PathRow>(tables, service_token, &query)
            .await
            .with_context(|| format!("failed to load metadata rows of {table} at offset {offset}"))?;
        if rows.is_empty() {
            break;
        }
        offset += rows.len();
        paths.extend(rows.into_iter().map(|row| row.url));
    }

    debug!(table, rows = offset, "loaded referenced paths");
    Ok(paths)
}

/// Deletes uploaded objects of `kind`'s bucket that no metadata row points
/// at and that predate `options.cutoff`. Needs a token that can read every
/// tenant's rows (the service role).
pub async fn reconcile_uploads(
    tables: &dyn TableStore,
    storage: &dyn ObjectStorage,
    service_token: &str,
    kind: &GalleryKind,
    options: ReconcileOptions,
) -> Result<ReconcileReport> {
    let dry_run = options.dry_run;
    let referenced = referenced_paths(tables, service_token, kind.table).await?;

    let objects = storage
        .list_objects(kind.bucket, &format!("{UPLOAD_PREFIX}/"))
        .await?;

    let mut report = ReconcileReport {
        bucket: kind.bucket.to_string(),
        scanned: objects.len(),
        ..Default::default()
    };

    for object in objects {
        if referenced.contains(&object.key) {
            continue;
        }
        // Unknown age counts as recent.
        if !object.last_modified.is_some_and(|at| at < options.cutoff) {
            report.recent += 1;
            continue;
        }
        let key = object.key;
        if !dry_run {
            match storage.delete_object(kind.bucket, &key).await {
                Ok(()) => report.deleted += 1,
                Err(err) => {
                    warn!(error = %err, bucket = kind.bucket, key = %key, "failed to delete orphaned object");
                    report.failed += 1;
                }
            }
        }
        report.orphaned.push(key);
    }

    info!(
        bucket = kind.bucket,
        scanned = report.scanned,
        recent = report.recent,
        orphaned = report.orphaned.len(),
        deleted = report.deleted,
        failed = report.failed,
        dry_run,
        "reconciled uploads"
    );
    Ok(report)
}
