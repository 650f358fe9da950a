//! Two-step upload: object write, then the metadata row that points at it.
//!
//! If the metadata insert fails the uploaded object is deleted again. When
//! that delete fails too, the key is reported as orphaned and left for
//! [`crate::reconcile`].

use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::error::BackendError;
use crate::storage::ObjectStorage;
use crate::tables::TableStore;

pub const UPLOAD_PREFIX: &str = "uploads";

/// A file picked by the user.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl SelectedFile {
    pub fn is_selected(&self) -> bool {
        !self.filename.trim().is_empty() && !self.bytes.is_empty()
    }
}

pub struct Upload<'a> {
    pub bucket: &'a str,
    pub table: &'a str,
    pub owner: &'a str,
    pub name: Option<&'a str>,
    pub file: SelectedFile,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File upload failed")]
    Storage(#[source] anyhow::Error),
    #[error("Error inserting photo metadata")]
    Metadata {
        #[source]
        source: BackendError,
        orphaned: Option<String>,
    },
}

/// `uploads/<epoch-millis>.<ext>`, or `uploads/<epoch-millis>` for a
/// filename without an extension.
pub fn upload_path(epoch_millis: i64, filename: &str) -> String {
    match extension(filename) {
        Some(ext) => format!("{UPLOAD_PREFIX}/{epoch_millis}.{ext}"),
        None => format!("{UPLOAD_PREFIX}/{epoch_millis}"),
    }
}

fn extension(filename: &str) -> Option<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Stores the file and inserts `{name, url, user_id}`. Returns the relative
/// storage path on success.
pub async fn upload_with_metadata(
    tables: &dyn TableStore,
    storage: &dyn ObjectStorage,
    token: &str,
    upload: Upload<'_>,
    epoch_millis: i64,
) -> Result<String, UploadError> {
    let Upload {
        bucket,
        table,
        owner,
        name,
        file,
    } = upload;
    let SelectedFile {
        filename,
        bytes,
        content_type,
    } = file;

    let path = upload_path(epoch_millis, &filename);
    let content_type = content_type.or_else(|| {
        mime_guess::from_path(&filename)
            .first()
            .map(|mime| mime.to_string())
    });
    let size = bytes.len();

    storage
        .put_object(bucket, &path, bytes, content_type)
        .await
        .map_err(|err| {
            error!(error = %err, bucket, key = %path, "failed to store upload");
            UploadError::Storage(err)
        })?;

    let display_name = name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(&filename);
    let row = json!({
        "name": display_name,
        "url": path,
        "user_id": owner,
    });

    if let Err(source) = tables.insert(token, table, vec![row]).await {
        error!(error = %source, table, key = %path, "failed to insert upload metadata");
        let orphaned = match storage.delete_object(bucket, &path).await {
            Ok(()) => {
                info!(bucket, key = %path, "removed upload after metadata failure");
                None
            }
            Err(err) => {
                error!(
                    error = %err,
                    bucket,
                    key = %path,
                    "compensating delete failed; object is orphaned"
                );
                Some(path)
            }
        };
        return Err(UploadError::Metadata { source, orphaned });
    }

    info!(bucket, key = %path, size, "upload stored");
    Ok(path)
}
