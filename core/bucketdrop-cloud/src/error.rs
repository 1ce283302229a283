//! Cloud error types.

use thiserror::Error;

/// Result type for cloud operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Why a sign-in attempt did not produce an account.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The user abandoned the sign-in flow.
    #[error("sign-in cancelled")]
    Cancelled,

    /// The identity provider refused the request (bad code, revoked grant).
    #[error("sign-in rejected: {0}")]
    Rejected(String),

    /// The identity provider could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The identity provider answered with something we could not use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The cached sign-in could not be read or written.
    #[error("sign-in cache error: {0}")]
    Cache(String),
}

/// Errors that can occur talking to Google Cloud.
#[derive(Debug, Error)]
pub enum CloudError {
    /// The API answered with an error status.
    #[error("{0}")]
    Api(String),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("preference store error: {0}")]
    Prefs(#[from] bucketdrop_prefs::PrefsError),
}
