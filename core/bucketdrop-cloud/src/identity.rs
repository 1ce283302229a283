//! Google sign-in.
//!
//! Implements the OAuth 2.0 installed-app flow: the user opens the consent
//! URL, pastes back the authorization code (or the whole redirect URL), and
//! the code is exchanged for tokens. The refresh token is cached in the
//! preference store so later launches find a signed-in account.

use crate::account::{AccessCredential, Account};
use crate::config::GoogleConfig;
use crate::error::{AuthError, CloudResult};
use async_trait::async_trait;
use bucketdrop_prefs::{PreferenceStore, Preferences};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

/// Preference namespace holding the cached sign-in.
pub const SIGN_IN_PREFS: &str = "GoogleSignIn";

const CACHED_ACCOUNT_KEY: &str = "account";

/// An external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the name of the identity provider.
    fn provider_name(&self) -> &'static str;

    /// Returns the account left signed in by a previous run, if any.
    async fn cached_account(&self) -> Result<Option<Account>, AuthError>;

    /// Returns the URL the user must visit to grant access.
    fn sign_in_url(&self) -> String;

    /// Completes sign-in with what the user pasted back from the consent page.
    async fn complete_sign_in(&self, response: &str) -> Result<Account, AuthError>;

    /// Signs out. Safe to call when nobody is signed in.
    async fn sign_out(&self) -> CloudResult<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedSignIn {
    account_id: String,
    email: Option<String>,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
}

/// Google implementation of [`IdentityProvider`].
pub struct GoogleIdentity {
    config: GoogleConfig,
    client: Client,
    cache: Preferences,
}

impl GoogleIdentity {
    /// Creates a provider that caches its sign-in in `store`.
    pub fn new(config: GoogleConfig, store: &PreferenceStore) -> CloudResult<Self> {
        let client = config.http_client()?;
        Ok(Self {
            config,
            client,
            cache: store.namespace(SIGN_IN_PREFS),
        })
    }

    fn load_cache(&self) -> Result<Option<CachedSignIn>, AuthError> {
        self.cache
            .get_json(CACHED_ACCOUNT_KEY)
            .map_err(|e| AuthError::Cache(e.to_string()))
    }

    fn store_cache(&self, cached: &CachedSignIn) -> Result<(), AuthError> {
        self.cache
            .put_json(CACHED_ACCOUNT_KEY, cached)
            .map_err(|e| AuthError::Cache(e.to_string()))
    }

    fn clear_cache(&self) -> Result<(), AuthError> {
        self.cache
            .remove(CACHED_ACCOUNT_KEY)
            .map(|_| ())
            .map_err(|e| AuthError::Cache(e.to_string()))
    }

    async fn request_tokens(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(format!("{}/token", self.config.oauth_base_url))
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("token request failed: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            let error = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(format!("{status}: {error}")));
        }
        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(AuthError::Network(format!("{status}: {error}")));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("failed to parse token response: {e}")))
    }

    async fn fetch_user_info(&self, credential: &AccessCredential) -> Result<UserInfo, AuthError> {
        let response = self
            .client
            .get(format!("{}/oauth2/v3/userinfo", self.config.api_base_url))
            .bearer_auth(&credential.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(AuthError::InvalidResponse(format!(
                "userinfo failed: {status}: {error}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("failed to parse userinfo: {e}")))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessCredential, AuthError> {
        debug!("Refreshing Google access token");
        let tokens = self
            .request_tokens(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;
        Ok(credential_from(&tokens))
    }
}

fn credential_from(tokens: &TokenResponse) -> AccessCredential {
    match tokens.expires_in {
        Some(secs) => AccessCredential::expiring_in(tokens.access_token.clone(), secs),
        None => AccessCredential::bearer(tokens.access_token.clone()),
    }
}

/// Pulls the authorization code out of a pasted code or redirect URL.
pub(crate) fn extract_auth_code(response: &str) -> Result<String, AuthError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(AuthError::Cancelled);
    }

    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Ok(trimmed.to_string());
    }
    let url = Url::parse(trimmed)
        .map_err(|e| AuthError::Rejected(format!("unreadable redirect URL: {e}")))?;

    let mut code = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(if error == "access_denied" {
            AuthError::Cancelled
        } else {
            AuthError::Rejected(error)
        });
    }
    code.filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::Rejected("redirect URL carries no authorization code".to_string()))
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    fn provider_name(&self) -> &'static str {
        "Google"
    }

    async fn cached_account(&self) -> Result<Option<Account>, AuthError> {
        let Some(cached) = self.load_cache()? else {
            return Ok(None);
        };

        match self.refresh(&cached.refresh_token).await {
            Ok(credential) => Ok(Some(Account {
                id: cached.account_id,
                email: cached.email,
                credential,
            })),
            Err(AuthError::Rejected(reason)) => {
                warn!("Cached Google sign-in no longer valid: {reason}");
                self.clear_cache()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn sign_in_url(&self) -> String {
        let scope = self.config.scopes.join(" ");
        format!(
            "{}/o/oauth2/v2/auth?\
            client_id={}&\
            redirect_uri={}&\
            response_type=code&\
            scope={}&\
            access_type=offline&\
            prompt=consent",
            self.config.auth_base_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&scope)
        )
    }

    async fn complete_sign_in(&self, response: &str) -> Result<Account, AuthError> {
        let code = extract_auth_code(response)?;
        debug!("Exchanging auth code for tokens");

        let tokens = self
            .request_tokens(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .await?;

        let credential = credential_from(&tokens);
        let user = self.fetch_user_info(&credential).await?;

        match &tokens.refresh_token {
            Some(refresh_token) => self.store_cache(&CachedSignIn {
                account_id: user.sub.clone(),
                email: user.email.clone(),
                refresh_token: refresh_token.clone(),
            })?,
            None => warn!("Google returned no refresh token; sign-in will not be remembered"),
        }

        let account = Account {
            id: user.sub,
            email: user.email,
            credential,
        };
        info!("Google sign-in successful for {}", account.display_name());
        Ok(account)
    }

    async fn sign_out(&self) -> CloudResult<()> {
        let Some(cached) = self.load_cache()? else {
            debug!("Sign-out requested with no cached account");
            return Ok(());
        };
        self.clear_cache()?;

        let revoke = self
            .client
            .post(format!("{}/revoke", self.config.oauth_base_url))
            .form(&[("token", cached.refresh_token.as_str())])
            .send()
            .await;
        match revoke {
            Ok(resp) if resp.status().is_success() => debug!("Revoked Google refresh token"),
            Ok(resp) => warn!("Token revocation returned {}", resp.status()),
            Err(e) => warn!("Token revocation failed: {e}"),
        }

        info!("Signed out of Google");
        Ok(())
    }
}
