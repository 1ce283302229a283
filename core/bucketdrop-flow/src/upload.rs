//! Uploading the pending file.
//!
//! An upload first resolves and opens the shared file and derives the object
//! name from its base name. In [`UploadMode::Announce`] that is all that
//! happens; [`UploadMode::Transfer`] then sends the bytes in one request.

use crate::config::UploadMode;
use bucketdrop_cloud::{CloudError, ObjectStorage, StoredObject};
use bucketdrop_types::FileRef;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::File;
use tracing::{debug, info};

/// Why an upload did not happen.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The reference does not point at anything readable on this machine.
    #[error("cannot resolve a readable path for {0}")]
    UnresolvablePath(String),

    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transfers need a storage client, which needs an account.
    #[error("not signed in")]
    NotSignedIn,

    #[error("{0}")]
    Cloud(#[from] CloudError),
}

/// What a finished upload did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The file was opened and the upload announced; nothing was sent.
    Announced { file_name: String, bucket: String },
    /// The file now exists in the bucket.
    Transferred(StoredObject),
}

/// An opened file ready to be sent.
#[derive(Debug)]
pub struct PreparedUpload {
    pub path: PathBuf,
    pub object_name: String,
    pub len: u64,
    file: File,
}

/// Opens the file behind `file_ref` and derives its object name.
pub async fn prepare_upload(file_ref: &FileRef) -> Result<PreparedUpload, UploadError> {
    let path = file_ref
        .local_path()
        .ok_or_else(|| UploadError::UnresolvablePath(file_ref.to_string()))?;

    let file = File::open(&path).await.map_err(|source| UploadError::Io {
        path: path.clone(),
        source,
    })?;
    let metadata = file.metadata().await.map_err(|source| UploadError::Io {
        path: path.clone(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(UploadError::NotAFile(path));
    }

    let object_name = file_ref
        .base_name()
        .ok_or_else(|| UploadError::UnresolvablePath(file_ref.to_string()))?;

    debug!("Prepared {} ({} bytes) as {}", path.display(), metadata.len(), object_name);
    Ok(PreparedUpload {
        path,
        object_name,
        len: metadata.len(),
        file,
    })
}

/// Runs one upload of `file_ref` into `bucket`.
pub async fn perform_upload(
    file_ref: &FileRef,
    bucket: &str,
    mode: UploadMode,
    storage: Option<Arc<dyn ObjectStorage>>,
) -> Result<UploadOutcome, UploadError> {
    let prepared = prepare_upload(file_ref).await?;

    match mode {
        UploadMode::Announce => {
            info!("Upload of {} to {} announced", prepared.object_name, bucket);
            Ok(UploadOutcome::Announced {
                file_name: prepared.object_name,
                bucket: bucket.to_string(),
            })
        }
        UploadMode::Transfer => {
            let storage = storage.ok_or(UploadError::NotSignedIn)?;
            let stored = storage
                .upload_object(bucket, &prepared.object_name, prepared.file, prepared.len)
                .await?;
            Ok(UploadOutcome::Transferred(stored))
        }
    }
}
