//! Error types for the upload flow.

use thiserror::Error;

/// Result type for flow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Errors returned to callers of the flow.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The selection names a bucket the selector does not hold.
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),

    /// The orchestrator is no longer running.
    #[error("channel closed")]
    ChannelClosed,
}
