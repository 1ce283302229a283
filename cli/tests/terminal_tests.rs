use async_trait::async_trait;
use bucketdrop_cli::{parse_bucket_choice, BucketChoice, Goal, Terminal};
use bucketdrop_cloud::{
    AccessCredential, Account, AuthError, CloudResult, IdentityProvider, ObjectStorage,
    StorageFactory, StoredObject,
};
use bucketdrop_flow::{create_flow, FlowConfig, UploadFlowController};
use bucketdrop_prefs::{PreferenceStore, LAST_SELECTED_BUCKET, UPLOADER_PREFS};
use bucketdrop_types::{FileRef, ShareIntent};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio::fs::File;

fn account() -> Account {
    Account {
        id: "1234".to_string(),
        email: Some("user@example.com".to_string()),
        credential: AccessCredential::bearer("tok"),
    }
}

struct FakeIdentity {
    cached: Option<Account>,
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn provider_name(&self) -> &'static str {
        "Fake"
    }

    async fn cached_account(&self) -> Result<Option<Account>, AuthError> {
        Ok(self.cached.clone())
    }

    fn sign_in_url(&self) -> String {
        "https://accounts.example.com/auth".to_string()
    }

    async fn complete_sign_in(&self, response: &str) -> Result<Account, AuthError> {
        if response == "good-code" {
            Ok(account())
        } else {
            Err(AuthError::Rejected(response.to_string()))
        }
    }

    async fn sign_out(&self) -> CloudResult<()> {
        Ok(())
    }
}

struct FakeStorage;

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn list_buckets(&self, _project_id: &str) -> CloudResult<Vec<String>> {
        Ok(vec!["a".to_string(), "b".to_string()])
    }

    async fn upload_object(
        &self,
        bucket: &str,
        object: &str,
        _file: File,
        len: u64,
    ) -> CloudResult<StoredObject> {
        Ok(StoredObject {
            bucket: bucket.to_string(),
            name: object.to_string(),
            size: len,
        })
    }
}

impl StorageFactory for FakeStorage {
    fn for_account(&self, _account: &Account) -> CloudResult<Arc<dyn ObjectStorage>> {
        Ok(Arc::new(FakeStorage))
    }
}

/// Runs one terminal session against a flow with fake Google services.
async fn session(
    store: &PreferenceStore,
    cached: Option<Account>,
    intent: Option<ShareIntent>,
    goal: Goal,
    input: &[u8],
) -> (anyhow::Result<()>, String) {
    let config = FlowConfig {
        project_id: Some("my-project".to_string()),
        ..Default::default()
    };
    let controller = UploadFlowController::new(config, store);
    let (orchestrator, handle, mut updates) = create_flow(
        controller,
        Arc::new(FakeIdentity { cached }),
        Arc::new(FakeStorage),
    );
    let flow = tokio::spawn(orchestrator.run());

    match intent {
        Some(intent) => handle.launch(intent).await.unwrap(),
        None => handle.sign_out().await.unwrap(),
    }

    let mut terminal = Terminal::new(input, Vec::new(), goal);
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        terminal.run(&handle, &mut updates),
    )
    .await
    .expect("terminal session timed out");

    handle.shutdown().await.unwrap();
    flow.await.unwrap();

    let output = String::from_utf8(terminal.into_output()).unwrap();
    (result, output)
}

fn shared_file(dir: &tempfile::TempDir) -> ShareIntent {
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"hello").unwrap();
    ShareIntent::send(FileRef::from_path(path))
}

fn remembered(store: &PreferenceStore) -> Option<String> {
    store
        .namespace(UPLOADER_PREFS)
        .get_string(LAST_SELECTED_BUCKET)
        .unwrap()
}

// ── Bucket prompt parsing ───────────────────────────────────────

#[test]
fn choice_by_number_name_and_default() {
    let items = vec!["a".to_string(), "b".to_string()];

    assert_eq!(
        parse_bucket_choice("2", &items, Some(0)),
        BucketChoice::Bucket("b".into())
    );
    assert_eq!(
        parse_bucket_choice(" a ", &items, Some(1)),
        BucketChoice::Bucket("a".into())
    );
    assert_eq!(
        parse_bucket_choice("", &items, Some(1)),
        BucketChoice::Bucket("b".into())
    );
    assert_eq!(parse_bucket_choice("Q", &items, None), BucketChoice::Quit);
}

#[test]
fn invalid_choices() {
    let items = vec!["a".to_string()];

    assert_eq!(parse_bucket_choice("0", &items, Some(0)), BucketChoice::Invalid);
    assert_eq!(parse_bucket_choice("2", &items, Some(0)), BucketChoice::Invalid);
    assert_eq!(parse_bucket_choice("zzz", &items, Some(0)), BucketChoice::Invalid);
    assert_eq!(parse_bucket_choice("", &items, None), BucketChoice::Invalid);
}

// ── Sessions ────────────────────────────────────────────────────

#[tokio::test]
async fn share_prompts_and_uploads() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::open_in_memory().unwrap();

    let (result, output) = session(
        &store,
        Some(account()),
        Some(shared_file(&dir)),
        Goal::Upload { bucket: None },
        b"2\n",
    )
    .await;

    result.unwrap();
    assert!(output.contains(" *  1) a"), "{output}");
    assert!(output.contains("Uploading notes.txt to b"), "{output}");
    assert_eq!(remembered(&store).as_deref(), Some("b"));
}

#[tokio::test]
async fn invalid_answer_asks_again() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::open_in_memory().unwrap();

    let (result, output) = session(
        &store,
        Some(account()),
        Some(shared_file(&dir)),
        Goal::Upload { bucket: None },
        b"7\n1\n",
    )
    .await;

    result.unwrap();
    assert!(output.contains("No such bucket: 7"), "{output}");
    assert!(output.contains("Uploading notes.txt to a"), "{output}");
}

#[tokio::test]
async fn share_with_bucket_skips_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::open_in_memory().unwrap();

    let (result, output) = session(
        &store,
        Some(account()),
        Some(shared_file(&dir)),
        Goal::Upload {
            bucket: Some("b".to_string()),
        },
        b"",
    )
    .await;

    result.unwrap();
    assert!(!output.contains("Buckets:"), "{output}");
    assert!(output.contains("Uploading notes.txt to b"), "{output}");
}

#[tokio::test]
async fn share_with_unknown_bucket_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = PreferenceStore::open_in_memory().unwrap();

    let (result, _) = session(
        &store,
        Some(account()),
        Some(shared_file(&dir)),
        Goal::Upload {
            bucket: Some("nope".to_string()),
        },
        b"",
    )
    .await;

    assert_eq!(result.unwrap_err().to_string(), "unknown bucket: nope");
}

#[tokio::test]
async fn sign_in_code_is_read_from_input() {
    let store = PreferenceStore::open_in_memory().unwrap();

    let (result, output) = session(
        &store,
        None,
        Some(ShareIntent::main()),
        Goal::PickBucket,
        b"good-code\n\n",
    )
    .await;

    result.unwrap();
    assert!(output.contains("https://accounts.example.com/auth"), "{output}");
    assert!(output.contains("Selected a"), "{output}");
    assert_eq!(remembered(&store).as_deref(), Some("a"));
}

#[tokio::test]
async fn empty_sign_in_answer_cancels() {
    let store = PreferenceStore::open_in_memory().unwrap();

    let (result, _) = session(
        &store,
        None,
        Some(ShareIntent::main()),
        Goal::PickBucket,
        b"\n",
    )
    .await;

    assert_eq!(result.unwrap_err().to_string(), "Authentication failed");
}

#[tokio::test]
async fn remembered_bucket_is_highlighted() {
    let store = PreferenceStore::open_in_memory().unwrap();
    store
        .namespace(UPLOADER_PREFS)
        .put_string(LAST_SELECTED_BUCKET, "b")
        .unwrap();

    let (result, output) = session(
        &store,
        Some(account()),
        Some(ShareIntent::main()),
        Goal::PickBucket,
        b"\n",
    )
    .await;

    result.unwrap();
    assert!(output.contains(" *  2) b"), "{output}");
    assert!(output.contains("Selected b"), "{output}");
}

#[tokio::test]
async fn sign_out_reports_logged_out() {
    let store = PreferenceStore::open_in_memory().unwrap();

    let (result, output) = session(&store, None, None, Goal::SignOut, b"").await;

    result.unwrap();
    assert!(output.contains("Logged out"), "{output}");
}
