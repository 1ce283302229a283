//! Upload flow controller: the flow's state machine without I/O.
//!
//! Each operation updates controller state and returns the [`Effect`]s the
//! orchestrator must carry out. Background results come back tagged with the
//! [`RequestToken`] they were issued under; results that are no longer
//! current are dropped.

use crate::config::{FlowConfig, PreselectPolicy};
use crate::error::{FlowError, FlowResult};
use crate::notification::Notification;
use crate::selector::BucketSelector;
use crate::upload::{UploadError, UploadOutcome};
use bucketdrop_cloud::{Account, AuthError, CloudError};
use bucketdrop_prefs::{PreferenceStore, Preferences, LAST_SELECTED_BUCKET, UPLOADER_PREFS};
use bucketdrop_types::{FileRef, RequestToken, ShareIntent, TokenSource};
use tracing::{debug, info, warn};

/// Where the flow stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    NoAccount,
    SigningIn,
    AuthenticatedNoBuckets,
    AuthenticatedBucketsListed,
}

impl FlowState {
    pub fn is_authenticated(self) -> bool {
        matches!(
            self,
            FlowState::AuthenticatedNoBuckets | FlowState::AuthenticatedBucketsListed
        )
    }
}

/// Work the orchestrator performs on the controller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the user to sign in with the identity provider.
    StartSignIn,
    /// List buckets with a storage client built from `account`.
    ListBuckets {
        token: RequestToken,
        account: Account,
    },
    /// Upload `file` into `bucket`.
    Upload {
        token: RequestToken,
        file: FileRef,
        bucket: String,
        account: Option<Account>,
    },
    /// Sign out of the identity provider.
    SignOut,
    /// Show a status message.
    Notify(Notification),
    /// The selector's entries or selection changed.
    SelectorChanged,
}

/// The share → sign-in → list → select → upload state machine.
pub struct UploadFlowController {
    config: FlowConfig,
    prefs: Preferences,
    state: FlowState,
    pending_file: Option<FileRef>,
    account: Option<Account>,
    selector: BucketSelector,
    tokens: TokenSource,
    /// Token of the only listing whose result will be accepted.
    current_listing: Option<RequestToken>,
}

impl UploadFlowController {
    /// Creates a controller that remembers its bucket choice in `store`.
    pub fn new(config: FlowConfig, store: &PreferenceStore) -> Self {
        Self {
            config,
            prefs: store.namespace(UPLOADER_PREFS),
            state: FlowState::NoAccount,
            pending_file: None,
            account: None,
            selector: BucketSelector::new(),
            tokens: TokenSource::new(),
            current_listing: None,
        }
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn pending_file(&self) -> Option<&FileRef> {
        self.pending_file.as_ref()
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn selector(&self) -> &BucketSelector {
        &self.selector
    }

    /// Reads the remembered bucket. A broken store reads as "nothing remembered".
    pub fn last_selected_bucket(&self) -> Option<String> {
        match self.prefs.get_string(LAST_SELECTED_BUCKET) {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not read last selected bucket: {e}");
                None
            }
        }
    }

    // ── Launch & sign-in ─────────────────────────────────────────

    /// Issues the token the cached-account lookup for a launch runs under.
    pub fn launch_token(&mut self) -> RequestToken {
        self.tokens.next_token()
    }

    /// Handles an inbound intent. `cached_account` is the account the
    /// identity provider still holds from an earlier run, looked up under
    /// `token`. A lookup from before a sign-out only contributes its file.
    pub fn on_launch(
        &mut self,
        token: RequestToken,
        intent: &ShareIntent,
        cached_account: Option<Account>,
    ) -> Vec<Effect> {
        if let Some(file) = intent.shared_file() {
            match &self.pending_file {
                None => {
                    info!("Received shared file {}", file);
                    self.pending_file = Some(file.clone());
                }
                Some(existing) => {
                    debug!("Ignoring shared file {}; {} is already pending", file, existing);
                }
            }
        }

        if !self.tokens.is_current_session(token) {
            debug!("Ignoring cached account from launch {token}; signed out since");
            return Vec::new();
        }

        match cached_account.or_else(|| self.account.clone()) {
            Some(account) => self.on_account_available(account),
            None => self.sign_in(),
        }
    }

    /// Starts the sign-in sub-flow unless one is already running or an
    /// account is present.
    pub fn sign_in(&mut self) -> Vec<Effect> {
        match self.state {
            FlowState::NoAccount => {
                self.state = FlowState::SigningIn;
                vec![Effect::StartSignIn]
            }
            FlowState::SigningIn => {
                debug!("Sign-in already in progress");
                Vec::new()
            }
            _ => {
                debug!("Already signed in");
                Vec::new()
            }
        }
    }

    /// Consumes the outcome of the sign-in sub-flow.
    pub fn on_sign_in_result(&mut self, result: Result<Account, AuthError>) -> Vec<Effect> {
        if self.state != FlowState::SigningIn {
            debug!("Dropping sign-in result outside of sign-in");
            return Vec::new();
        }

        match result {
            Ok(account) => self.on_account_available(account),
            Err(e) => {
                warn!("Sign-in failed: {e}");
                self.state = FlowState::NoAccount;
                vec![Effect::Notify(Notification::AuthenticationFailed)]
            }
        }
    }

    fn on_account_available(&mut self, account: Account) -> Vec<Effect> {
        info!("Signed in as {}", account.display_name());
        self.account = Some(account.clone());
        if !self.state.is_authenticated() {
            self.state = FlowState::AuthenticatedNoBuckets;
        }
        vec![self.list_buckets(account)]
    }

    // ── Bucket listing ───────────────────────────────────────────

    /// Issues a listing for `account`, superseding any listing in flight.
    pub fn list_buckets(&mut self, account: Account) -> Effect {
        let token = self.tokens.next_token();
        if let Some(previous) = self.current_listing.replace(token) {
            debug!("Listing {previous} superseded by {token}");
        }
        Effect::ListBuckets { token, account }
    }

    /// Consumes a listing result.
    pub fn on_buckets_listed(
        &mut self,
        token: RequestToken,
        result: Result<Vec<String>, CloudError>,
    ) -> Vec<Effect> {
        if self.current_listing != Some(token) {
            debug!("Discarding stale listing {token}");
            return Vec::new();
        }
        self.current_listing = None;

        match result {
            Ok(names) => self.populate_selector(names),
            Err(e) => {
                warn!("Bucket listing failed: {e}");
                let mut effects = Vec::new();
                if self.selector.is_populated() {
                    self.selector.clear();
                    effects.push(Effect::SelectorChanged);
                }
                if self.state == FlowState::AuthenticatedBucketsListed {
                    self.state = FlowState::AuthenticatedNoBuckets;
                }
                effects.push(Effect::Notify(Notification::BucketFetchFailed(e.to_string())));
                effects
            }
        }
    }

    /// Fills the selector and restores the remembered bucket when it is listed.
    pub fn populate_selector(&mut self, names: Vec<String>) -> Vec<Effect> {
        let remembered = self.last_selected_bucket();
        self.selector.populate(names);

        let restored = remembered.as_deref().and_then(|name| self.selector.position(name));
        match restored {
            Some(index) => {
                self.selector.select_index(index);
            }
            None => {
                if let Some(name) = remembered {
                    debug!("Remembered bucket {name} is no longer listed");
                }
                self.selector.select_index(0);
            }
        }

        if self.state.is_authenticated() {
            self.state = FlowState::AuthenticatedBucketsListed;
        }

        let mut effects = vec![Effect::SelectorChanged];
        if self.config.preselect_policy == PreselectPolicy::FireHandler {
            if let Some(name) = self.selector.selected_name().map(str::to_string) {
                effects.extend(self.handle_selection(&name));
            }
        }
        effects
    }

    // ── Selection & upload ───────────────────────────────────────

    /// Handles the user picking `name` in the selector.
    pub fn on_bucket_selected(&mut self, name: &str) -> FlowResult<Vec<Effect>> {
        if !self.selector.select_name(name) {
            return Err(FlowError::UnknownBucket(name.to_string()));
        }
        let mut effects = vec![Effect::SelectorChanged];
        effects.extend(self.handle_selection(name));
        Ok(effects)
    }

    fn handle_selection(&mut self, name: &str) -> Vec<Effect> {
        if let Err(e) = self.prefs.put_string(LAST_SELECTED_BUCKET, name) {
            warn!("Could not remember bucket {name}: {e}");
        }

        match &self.pending_file {
            Some(file) => vec![Effect::Upload {
                token: self.tokens.next_token(),
                file: file.clone(),
                bucket: name.to_string(),
                account: self.account.clone(),
            }],
            None => Vec::new(),
        }
    }

    /// Consumes an upload result.
    pub fn on_upload_finished(
        &mut self,
        token: RequestToken,
        result: Result<UploadOutcome, UploadError>,
    ) -> Vec<Effect> {
        if !self.tokens.is_current_session(token) {
            debug!("Discarding upload result {token} from a signed-out session");
            return Vec::new();
        }

        let notification = match result {
            Ok(UploadOutcome::Announced { file_name, bucket }) => {
                Notification::UploadStarted { file_name, bucket }
            }
            Ok(UploadOutcome::Transferred(object)) => Notification::UploadCompleted {
                object: object.name,
                bucket: object.bucket,
            },
            Err(e) => {
                warn!("Upload failed: {e}");
                Notification::UploadFailed(e.to_string())
            }
        };
        vec![Effect::Notify(notification)]
    }

    // ── Sign-out ─────────────────────────────────────────────────

    /// Signs out and empties the selector. The pending file and the
    /// remembered bucket are kept.
    pub fn sign_out(&mut self) -> Vec<Effect> {
        self.account = None;
        self.selector.clear();
        self.current_listing = None;
        self.tokens.begin_session();
        self.state = FlowState::NoAccount;
        vec![
            Effect::SignOut,
            Effect::SelectorChanged,
            Effect::Notify(Notification::LoggedOut),
        ]
    }
}
