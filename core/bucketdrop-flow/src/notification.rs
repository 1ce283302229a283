//! User-visible status messages.

use std::fmt;

/// How long a notification stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationDuration {
    Short,
    Long,
}

/// A transient, non-blocking status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    LoggedOut,
    AuthenticationFailed,
    BucketFetchFailed(String),
    UploadStarted { file_name: String, bucket: String },
    UploadCompleted { object: String, bucket: String },
    UploadFailed(String),
}

impl Notification {
    pub fn duration(&self) -> NotificationDuration {
        match self {
            Notification::LoggedOut | Notification::AuthenticationFailed => {
                NotificationDuration::Short
            }
            _ => NotificationDuration::Long,
        }
    }

    /// Returns true for failure messages.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notification::AuthenticationFailed
                | Notification::BucketFetchFailed(_)
                | Notification::UploadFailed(_)
        )
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::LoggedOut => f.write_str("Logged out"),
            Notification::AuthenticationFailed => f.write_str("Authentication failed"),
            Notification::BucketFetchFailed(msg) => write!(f, "Failed to fetch buckets: {msg}"),
            Notification::UploadStarted { file_name, bucket } => {
                write!(f, "Uploading {file_name} to {bucket}")
            }
            Notification::UploadCompleted { object, bucket } => {
                write!(f, "Uploaded {object} to {bucket}")
            }
            Notification::UploadFailed(msg) => write!(f, "Upload failed: {msg}"),
        }
    }
}
