//! Flow configuration.

use serde::{Deserialize, Serialize};

/// Whether restoring the remembered bucket counts as a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreselectPolicy {
    /// Populating the selector only highlights an entry; nothing is uploaded
    /// until the user picks a bucket.
    #[default]
    Silent,
    /// Populating the selector runs the selection handler for the initial
    /// entry, which uploads a pending file straight away.
    FireHandler,
}

/// What an upload does once the file has been opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// Announce the upload and stop there.
    #[default]
    Announce,
    /// Send the file to the bucket in a single media upload.
    Transfer,
}

/// Configuration for the upload flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Cloud project whose buckets are listed.
    pub project_id: Option<String>,
    pub preselect_policy: PreselectPolicy,
    pub upload_mode: UploadMode,
}

impl FlowConfig {
    /// The configured project id, ignoring blank values.
    pub fn project_id(&self) -> Option<&str> {
        self.project_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}
