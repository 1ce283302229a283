//! Core type definitions for bucketdrop.
//!
//! This crate defines the plain data shared by every other crate:
//! - Share intents and the file references they carry
//! - Request tokens used to tell current background results from stale ones
//!
//! Nothing in here performs I/O.

mod file_ref;
mod intent;
mod token;

pub use file_ref::FileRef;
pub use intent::{IntentAction, ShareIntent};
pub use token::{RequestToken, TokenSource};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("empty file reference")]
    EmptyFileRef,

    #[error("invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),
}
