//! Google endpoint and client configuration.

use serde::{Deserialize, Serialize};

/// Read/write access to Cloud Storage.
pub const DEVSTORAGE_READ_WRITE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

/// Access to the user's e-mail address.
pub const EMAIL_SCOPE: &str = "email";

/// Google OAuth client and API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Redirect URI registered for the installed-app client.
    pub redirect_uri: String,
    /// Scopes requested at sign-in.
    pub scopes: Vec<String>,
    /// Sent as the `User-Agent` prefix on every request.
    pub application_name: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Base URL for Google APIs (e.g. `https://www.googleapis.com`).
    pub api_base_url: String,
    /// Base URL for Google OAuth2 (e.g. `https://oauth2.googleapis.com`).
    pub oauth_base_url: String,
    /// Base URL for the Google Accounts consent page.
    pub auth_base_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost".to_string(),
            scopes: vec![DEVSTORAGE_READ_WRITE.to_string(), EMAIL_SCOPE.to_string()],
            application_name: "GCS Uploader".to_string(),
            request_timeout_secs: 60,
            api_base_url: "https://www.googleapis.com".to_string(),
            oauth_base_url: "https://oauth2.googleapis.com".to_string(),
            auth_base_url: "https://accounts.google.com".to_string(),
        }
    }
}

impl GoogleConfig {
    pub(crate) fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.request_timeout_secs))
            .user_agent(format!(
                "{}/{}",
                self.application_name.replace(' ', "-"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()
    }
}
