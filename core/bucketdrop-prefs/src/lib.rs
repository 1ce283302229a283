//! Persistent key-value preferences for bucketdrop.
//!
//! Preferences are grouped by namespace and survive process restarts. The
//! store is a single SQLite file; values are plain strings, with JSON helpers
//! for small structured values.

mod error;
mod store;

pub use error::{PrefsError, PrefsResult};
pub use store::{PreferenceStore, Preferences};

/// Namespace holding the uploader's own preferences.
pub const UPLOADER_PREFS: &str = "GCSUploaderPrefs";

/// Key under which the last selected bucket is remembered.
pub const LAST_SELECTED_BUCKET: &str = "LastSelectedBucket";
