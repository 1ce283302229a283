use bucketdrop_cloud::{
    AccessCredential, Account, CloudError, GcsClient, GcsFactory, GoogleConfig, ObjectStorage,
    StorageFactory,
};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::{Duration, SystemTime};
use wiremock::matchers::{body_string, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_config(server: &MockServer) -> GoogleConfig {
    GoogleConfig {
        api_base_url: server.uri(),
        oauth_base_url: server.uri(),
        auth_base_url: server.uri(),
        ..Default::default()
    }
}

fn client(server: &MockServer) -> GcsClient {
    GcsClient::new(&mock_config(server), AccessCredential::bearer("tok")).unwrap()
}

// ── list_buckets ────────────────────────────────────────────────

#[tokio::test]
async fn list_buckets_preserves_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(query_param("project", "my-project"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"name": "zeta"}, {"name": "alpha"}, {"name": "mid"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let names = client(&server).list_buckets("my-project").await.unwrap();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[tokio::test]
async fn list_buckets_without_items_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "storage#buckets"
        })))
        .mount(&server)
        .await;

    let names = client(&server).list_buckets("p").await.unwrap();
    assert!(names.is_empty());
}

#[tokio::test]
async fn list_buckets_follows_page_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"name": "a"}, {"name": "b"}],
            "nextPageToken": "page2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(query_param("pageToken", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"name": "c"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let names = client(&server).list_buckets("p").await.unwrap();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn list_buckets_surfaces_api_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"code": 403, "message": "caller does not have storage.buckets.list access"}
        })))
        .mount(&server)
        .await;

    let err = client(&server).list_buckets("p").await.unwrap_err();
    assert!(matches!(err, CloudError::Api(_)));
    assert_eq!(
        err.to_string(),
        "403 caller does not have storage.buckets.list access"
    );
}

#[tokio::test]
async fn list_buckets_plain_text_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&server)
        .await;

    let err = client(&server).list_buckets("p").await.unwrap_err();
    assert!(err.to_string().contains("backend down"));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn list_buckets_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .mount(&server)
        .await;

    let err = client(&server).list_buckets("p").await.unwrap_err();
    assert!(matches!(err, CloudError::Api(ref msg) if msg.starts_with("401")), "{err}");
}

#[tokio::test]
async fn list_buckets_requires_project_id() {
    let server = MockServer::start().await;

    let err = client(&server).list_buckets("  ").await.unwrap_err();
    assert!(matches!(err, CloudError::Config(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ── upload_object ───────────────────────────────────────────────

#[tokio::test]
async fn upload_object_sends_media_upload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/photos/o"))
        .and(query_param("uploadType", "media"))
        .and(query_param("name", "cat.jpg"))
        .and(header("authorization", "Bearer tok"))
        .and(body_string("meow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "cat.jpg",
            "bucket": "photos",
            "size": "4"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(b"meow").unwrap();
    let file = tokio::fs::File::open(tmp.path()).await.unwrap();

    let stored = client(&server)
        .upload_object("photos", "cat.jpg", file, 4)
        .await
        .unwrap();
    assert_eq!(stored.bucket, "photos");
    assert_eq!(stored.name, "cat.jpg");
    assert_eq!(stored.size, 4);
}

#[tokio::test]
async fn upload_object_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/photos/o"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "The specified bucket does not exist."}
        })))
        .mount(&server)
        .await;

    let tmp = tempfile::NamedTempFile::new().unwrap();
    let file = tokio::fs::File::open(tmp.path()).await.unwrap();

    let err = client(&server)
        .upload_object("photos", "empty.bin", file, 0)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "404 The specified bucket does not exist.");
}

// ── Factory ─────────────────────────────────────────────────────

#[tokio::test]
async fn factory_builds_client_with_account_credential() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(header("authorization", "Bearer account-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"name": "only"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let account = Account {
        id: "123".into(),
        email: Some("user@example.com".into()),
        credential: AccessCredential::bearer("account-token"),
    };
    let storage = GcsFactory::new(mock_config(&server))
        .for_account(&account)
        .unwrap();
    assert_eq!(storage.list_buckets("p").await.unwrap(), vec!["only"]);
}

#[test]
fn factory_refuses_expired_credential() {
    let account = Account {
        id: "123".into(),
        email: Some("user@example.com".into()),
        credential: AccessCredential {
            access_token: "stale".into(),
            expires_at: Some(SystemTime::now() - Duration::from_secs(5)),
        },
    };

    let err = match GcsFactory::new(GoogleConfig::default()).for_account(&account) {
        Ok(_) => panic!("expired credential was accepted"),
        Err(e) => e,
    };
    assert!(matches!(err, CloudError::Auth(_)));
    assert!(err.to_string().contains("user@example.com"), "{err}");
}
