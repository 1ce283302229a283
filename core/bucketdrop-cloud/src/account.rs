//! Signed-in accounts and the credentials derived from them.

use std::fmt;
use std::time::{Duration, SystemTime};

/// A bearer token with an optional expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential {
    pub access_token: String,
    pub expires_at: Option<SystemTime>,
}

impl AccessCredential {
    /// A credential that never expires (tests, externally managed tokens).
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// A credential valid for `expires_in` seconds, minus a 60s buffer.
    pub fn expiring_in(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Some(SystemTime::now() + Duration::from_secs(expires_in.saturating_sub(60))),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| SystemTime::now() > exp)
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// An identity returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Stable account identifier (the OpenID `sub` claim for Google).
    pub id: String,
    /// E-mail address, when the provider disclosed one.
    pub email: Option<String>,
    /// Credential used to authenticate storage calls.
    pub credential: AccessCredential,
}

impl Account {
    /// A short human-readable label for logs and status lines.
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}
