//! Cloud Storage access.
//!
//! Uses the Cloud Storage JSON API v1 for bucket listing and simple
//! (single-request) media uploads.

use crate::account::{AccessCredential, Account};
use crate::config::GoogleConfig;
use crate::error::{AuthError, CloudError, CloudResult};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::sync::Arc;
use tokio::fs::File;
use tracing::{debug, info};

/// Largest page the bucket listing asks for.
const LIST_PAGE_SIZE: &str = "1000";

/// Metadata of an object after upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub name: String,
    pub size: u64,
}

/// An authenticated object-storage client.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Lists the bucket names of a project, in the order the service returns them.
    async fn list_buckets(&self, project_id: &str) -> CloudResult<Vec<String>>;

    /// Uploads `len` bytes read from `file` as `bucket/object`.
    async fn upload_object(
        &self,
        bucket: &str,
        object: &str,
        file: File,
        len: u64,
    ) -> CloudResult<StoredObject>;
}

/// Builds a storage client for a signed-in account.
pub trait StorageFactory: Send + Sync {
    fn for_account(&self, account: &Account) -> CloudResult<Arc<dyn ObjectStorage>>;
}

/// Cloud Storage API response structures.
#[derive(Debug, Deserialize)]
struct BucketList {
    #[serde(default)]
    items: Option<Vec<BucketResource>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BucketResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    bucket: String,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: String,
}

/// Turns a non-2xx response into [`CloudError::Api`], preferring the
/// message from Google's JSON error envelope.
async fn api_error(response: Response) -> CloudError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => {
            let code = envelope.error.code.unwrap_or(status.as_u16());
            CloudError::Api(format!("{code} {}", envelope.error.message))
        }
        Err(_) if body.trim().is_empty() => CloudError::Api(status.to_string()),
        Err(_) => CloudError::Api(format!("{status}: {}", body.trim())),
    }
}

/// Cloud Storage JSON API client bound to one credential.
pub struct GcsClient {
    api_base_url: String,
    credential: AccessCredential,
    client: Client,
}

impl GcsClient {
    /// Creates a client that authenticates with `credential`.
    pub fn new(config: &GoogleConfig, credential: AccessCredential) -> CloudResult<Self> {
        Ok(Self {
            api_base_url: config.api_base_url.clone(),
            credential,
            client: config.http_client()?,
        })
    }
}

#[async_trait]
impl ObjectStorage for GcsClient {
    async fn list_buckets(&self, project_id: &str) -> CloudResult<Vec<String>> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err(CloudError::Config("project id is not configured".to_string()));
        }

        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{}/storage/v1/b", self.api_base_url))
                .bearer_auth(&self.credential.access_token)
                .query(&[
                    ("project", project_id),
                    ("fields", "nextPageToken,items(name)"),
                    ("maxResults", LIST_PAGE_SIZE),
                ]);

            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let page: BucketList = response.json().await?;
            names.extend(page.items.unwrap_or_default().into_iter().map(|b| b.name));

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        debug!("Listed {} buckets in project {}", names.len(), project_id);
        Ok(names)
    }

    async fn upload_object(
        &self,
        bucket: &str,
        object: &str,
        file: File,
        len: u64,
    ) -> CloudResult<StoredObject> {
        debug!("Uploading {} ({} bytes) to bucket {}", object, len, bucket);

        let response = self
            .client
            .post(format!(
                "{}/upload/storage/v1/b/{}/o",
                self.api_base_url,
                urlencoding::encode(bucket)
            ))
            .bearer_auth(&self.credential.access_token)
            .query(&[("uploadType", "media"), ("name", object)])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .header(reqwest::header::CONTENT_LENGTH, len)
            .body(reqwest::Body::from(file))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let stored: ObjectResource = response.json().await?;
        let size = stored.size.and_then(|s| s.parse().ok()).unwrap_or(len);
        info!("Uploaded gs://{}/{}", stored.bucket, stored.name);

        Ok(StoredObject {
            bucket: stored.bucket,
            name: stored.name,
            size,
        })
    }
}

/// Builds a [`GcsClient`] per account.
#[derive(Debug, Clone)]
pub struct GcsFactory {
    config: GoogleConfig,
}

impl GcsFactory {
    pub fn new(config: GoogleConfig) -> Self {
        Self { config }
    }
}

impl StorageFactory for GcsFactory {
    fn for_account(&self, account: &Account) -> CloudResult<Arc<dyn ObjectStorage>> {
        if account.credential.is_expired() {
            return Err(CloudError::Auth(AuthError::Rejected(format!(
                "access token for {} has expired; sign in again",
                account.display_name()
            ))));
        }
        debug!("Building storage client for {}", account.display_name());
        let client = GcsClient::new(&self.config, account.credential.clone())?;
        Ok(Arc::new(client))
    }
}
