//! Flow orchestrator: runs the controller and performs its effects.
//!
//! The orchestrator task is the only owner of the controller. Network work
//! runs on spawned tasks whose completions are sent back over a channel, so
//! controller state and front-end updates are only ever touched from the
//! orchestrator task.

use crate::controller::{Effect, FlowState, UploadFlowController};
use crate::error::{FlowError, FlowResult};
use crate::notification::Notification;
use crate::upload::{perform_upload, UploadError, UploadOutcome};
use bucketdrop_cloud::{
    Account, AuthError, CloudError, IdentityProvider, ObjectStorage, StorageFactory,
};
use bucketdrop_types::{RequestToken, ShareIntent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 32;

/// Commands sent from the front-end.
#[derive(Debug, Clone)]
pub enum FlowCommand {
    /// An intent arrived (process launch or a later share).
    Launch(ShareIntent),
    /// Start sign-in manually after an earlier failure.
    SignIn,
    /// The user pasted the authorization code or redirect URL.
    CompleteSignIn(String),
    /// The user abandoned sign-in.
    CancelSignIn,
    /// The user picked a bucket.
    SelectBucket(String),
    SignOut,
    Shutdown,
}

/// Updates sent to the front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowUpdate {
    /// The user must visit `url` and paste back the result.
    SignInRequired { url: String },
    /// The selector must be redrawn.
    SelectorChanged {
        items: Vec<String>,
        selected: Option<usize>,
    },
    StateChanged(FlowState),
    Notification(Notification),
    /// A command could not be applied (e.g. selecting an unknown bucket).
    Rejected(String),
}

/// Background completions, delivered back to the orchestrator task.
enum Completion {
    Launch(RequestToken, ShareIntent, Result<Option<Account>, AuthError>),
    SignIn(Result<Account, AuthError>),
    Buckets(RequestToken, Result<Vec<String>, CloudError>),
    Upload(RequestToken, Result<UploadOutcome, UploadError>),
}

/// Front-end side of the flow.
#[derive(Debug, Clone)]
pub struct FlowHandle {
    commands: mpsc::Sender<FlowCommand>,
}

impl FlowHandle {
    /// Sends a command to the orchestrator.
    pub async fn send(&self, command: FlowCommand) -> FlowResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| FlowError::ChannelClosed)
    }

    pub async fn launch(&self, intent: ShareIntent) -> FlowResult<()> {
        self.send(FlowCommand::Launch(intent)).await
    }

    pub async fn complete_sign_in(&self, response: impl Into<String>) -> FlowResult<()> {
        self.send(FlowCommand::CompleteSignIn(response.into())).await
    }

    pub async fn select_bucket(&self, name: impl Into<String>) -> FlowResult<()> {
        self.send(FlowCommand::SelectBucket(name.into())).await
    }

    pub async fn sign_out(&self) -> FlowResult<()> {
        self.send(FlowCommand::SignOut).await
    }

    pub async fn shutdown(&self) -> FlowResult<()> {
        self.send(FlowCommand::Shutdown).await
    }
}

/// Owns the controller and executes its effects.
pub struct FlowOrchestrator {
    controller: UploadFlowController,
    identity: Arc<dyn IdentityProvider>,
    storage: Arc<dyn StorageFactory>,
    commands: mpsc::Receiver<FlowCommand>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    updates: mpsc::UnboundedSender<FlowUpdate>,
    /// Sign-outs still running; awaited before [`FlowOrchestrator::run`] returns.
    sign_outs: JoinSet<()>,
}

/// Wires a controller to its identity provider and storage factory.
///
/// Returns the orchestrator (to be driven with [`FlowOrchestrator::run`]),
/// the handle for sending commands, and the stream of front-end updates.
pub fn create_flow(
    controller: UploadFlowController,
    identity: Arc<dyn IdentityProvider>,
    storage: Arc<dyn StorageFactory>,
) -> (
    FlowOrchestrator,
    FlowHandle,
    mpsc::UnboundedReceiver<FlowUpdate>,
) {
    let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
    let (completions_tx, completions_rx) = mpsc::unbounded_channel();
    let (updates, updates_rx) = mpsc::unbounded_channel();

    let orchestrator = FlowOrchestrator {
        controller,
        identity,
        storage,
        commands,
        completions_tx,
        completions_rx,
        updates,
        sign_outs: JoinSet::new(),
    };
    (
        orchestrator,
        FlowHandle {
            commands: commands_tx,
        },
        updates_rx,
    )
}

impl FlowOrchestrator {
    /// Runs until a [`FlowCommand::Shutdown`] arrives or every handle is dropped.
    /// Pending sign-outs are finished first, so the cached sign-in is gone
    /// by the time this returns. Returns the controller for inspection.
    pub async fn run(mut self) -> UploadFlowController {
        info!("Upload flow started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    None | Some(FlowCommand::Shutdown) => break,
                    Some(command) => self.handle_command(command),
                },
                Some(completion) = self.completions_rx.recv() => {
                    self.handle_completion(completion);
                }
                Some(joined) = self.sign_outs.join_next(), if !self.sign_outs.is_empty() => {
                    if let Err(e) = joined {
                        warn!("Sign-out task failed: {e}");
                    }
                }
            }
        }
        while let Some(joined) = self.sign_outs.join_next().await {
            if let Err(e) = joined {
                warn!("Sign-out task failed: {e}");
            }
        }
        info!("Upload flow stopped");
        self.controller
    }

    fn handle_command(&mut self, command: FlowCommand) {
        debug!("Flow command: {:?}", command);
        let before = self.controller.state();

        let effects = match command {
            FlowCommand::Launch(intent) => {
                let token = self.controller.launch_token();
                let identity = Arc::clone(&self.identity);
                self.spawn(async move {
                    let cached = identity.cached_account().await;
                    Completion::Launch(token, intent, cached)
                });
                Vec::new()
            }
            FlowCommand::SignIn => self.controller.sign_in(),
            FlowCommand::CompleteSignIn(response) => {
                if self.controller.state() == FlowState::SigningIn {
                    let identity = Arc::clone(&self.identity);
                    self.spawn(async move {
                        Completion::SignIn(identity.complete_sign_in(&response).await)
                    });
                } else {
                    self.emit(FlowUpdate::Rejected("no sign-in in progress".to_string()));
                }
                Vec::new()
            }
            FlowCommand::CancelSignIn => self.controller.on_sign_in_result(Err(AuthError::Cancelled)),
            FlowCommand::SelectBucket(name) => match self.controller.on_bucket_selected(&name) {
                Ok(effects) => effects,
                Err(e) => {
                    self.emit(FlowUpdate::Rejected(e.to_string()));
                    Vec::new()
                }
            },
            FlowCommand::SignOut => self.controller.sign_out(),
            FlowCommand::Shutdown => Vec::new(),
        };

        self.apply(effects, before);
    }

    fn handle_completion(&mut self, completion: Completion) {
        let before = self.controller.state();

        let effects = match completion {
            Completion::Launch(token, intent, cached) => {
                let cached = cached.unwrap_or_else(|e| {
                    warn!("Could not restore cached sign-in: {e}");
                    None
                });
                self.controller.on_launch(token, &intent, cached)
            }
            Completion::SignIn(result) => self.controller.on_sign_in_result(result),
            Completion::Buckets(token, result) => self.controller.on_buckets_listed(token, result),
            Completion::Upload(token, result) => self.controller.on_upload_finished(token, result),
        };

        self.apply(effects, before);
    }

    fn apply(&mut self, effects: Vec<Effect>, before: FlowState) {
        for effect in effects {
            self.execute(effect);
        }
        let after = self.controller.state();
        if after != before {
            debug!("Flow state {:?} -> {:?}", before, after);
            self.emit(FlowUpdate::StateChanged(after));
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::StartSignIn => {
                let url = self.identity.sign_in_url();
                info!("Sign-in required with {}", self.identity.provider_name());
                self.emit(FlowUpdate::SignInRequired { url });
            }
            Effect::ListBuckets { token, account } => {
                let storage = Arc::clone(&self.storage);
                let project_id = self.controller.config().project_id().map(str::to_string);
                self.spawn(async move {
                    let result = match project_id {
                        Some(project_id) => match storage.for_account(&account) {
                            Ok(client) => client.list_buckets(&project_id).await,
                            Err(e) => Err(e),
                        },
                        None => Err(CloudError::Config("project id is not configured".to_string())),
                    };
                    Completion::Buckets(token, result)
                });
            }
            Effect::Upload {
                token,
                file,
                bucket,
                account,
            } => {
                let mode = self.controller.config().upload_mode;
                let client: Option<Arc<dyn ObjectStorage>> = match &account {
                    Some(account) => match self.storage.for_account(account) {
                        Ok(client) => Some(client),
                        Err(e) => {
                            warn!("Could not build storage client for upload: {e}");
                            None
                        }
                    },
                    None => None,
                };
                self.spawn(async move {
                    let result = perform_upload(&file, &bucket, mode, client).await;
                    Completion::Upload(token, result)
                });
            }
            Effect::SignOut => {
                let identity = Arc::clone(&self.identity);
                self.sign_outs.spawn(async move {
                    if let Err(e) = identity.sign_out().await {
                        warn!("Sign-out failed: {e}");
                    }
                });
            }
            Effect::Notify(notification) => {
                info!("{}", notification);
                self.emit(FlowUpdate::Notification(notification));
            }
            Effect::SelectorChanged => {
                let selector = self.controller.selector();
                self.emit(FlowUpdate::SelectorChanged {
                    items: selector.items().to_vec(),
                    selected: selector.selected_index(),
                });
            }
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = Completion> + Send + 'static,
    {
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            if completions.send(task.await).is_err() {
                debug!("Flow stopped; dropping background result");
            }
        });
    }

    fn emit(&self, update: FlowUpdate) {
        if self.updates.send(update).is_err() {
            debug!("Front-end gone; dropping update");
        }
    }
}
