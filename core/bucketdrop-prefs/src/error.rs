//! Error types for the preference store.

use thiserror::Error;

/// Result type for preference operations.
pub type PrefsResult<T> = Result<T, PrefsError>;

/// Errors that can occur while reading or writing preferences.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// The underlying database failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another thread panicked while holding the connection.
    #[error("preference store lock poisoned")]
    Poisoned,
}
