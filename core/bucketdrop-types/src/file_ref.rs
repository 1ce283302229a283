//! References to files handed to the application by a share intent.
//!
//! A reference is either a bare filesystem path or a URI. `file://` URIs
//! resolve to local paths; other schemes (`content://…` and friends) only
//! contribute a path component, which is enough to derive an object name but
//! not to open the file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// A file reference as delivered by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(String);

impl FileRef {
    /// Parses a file reference. URIs must be well formed; anything without a
    /// scheme is taken as a path.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyFileRef);
        }
        if looks_like_uri(trimmed) {
            Url::parse(trimmed)?;
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Creates a reference to a local path.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self(path.as_ref().to_string_lossy().into_owned())
    }

    /// Returns the reference exactly as it was received.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the path component of the reference.
    ///
    /// `None` when the reference has no path (e.g. `content://authority`).
    pub fn path(&self) -> Option<PathBuf> {
        match self.uri() {
            None => Some(PathBuf::from(&self.0)),
            Some(url) if url.scheme() == "file" => url.to_file_path().ok(),
            Some(url) => {
                let decoded = urlencoding::decode(url.path()).ok()?;
                if decoded.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(decoded.into_owned()))
                }
            }
        }
    }

    /// Returns a path that can be opened on this machine.
    pub fn local_path(&self) -> Option<PathBuf> {
        match self.uri() {
            None => Some(PathBuf::from(&self.0)),
            Some(url) if url.scheme() == "file" => url.to_file_path().ok(),
            Some(_) => None,
        }
    }

    /// Returns the last path segment, used as the object name on upload.
    pub fn base_name(&self) -> Option<String> {
        self.path()?
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    fn uri(&self) -> Option<Url> {
        if looks_like_uri(&self.0) {
            Url::parse(&self.0).ok()
        } else {
            None
        }
    }
}

/// Single-letter schemes are Windows drive letters, not URIs.
fn looks_like_uri(s: &str) -> bool {
    match s.split_once("://") {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FileRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
