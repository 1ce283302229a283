//! bucketdrop: share a file into a Google Cloud Storage bucket.
//!
//! Usage:
//!   bucketdrop share ./photo.jpg          # sign in if needed, pick a bucket, upload
//!   bucketdrop share ./photo.jpg -b logs  # upload straight into `logs`
//!   bucketdrop launch                     # pick and remember a bucket
//!   bucketdrop sign-out
//!
//! The last bucket picked is remembered and highlighted on the next run.

use anyhow::{Context, Result};
use bucketdrop_cli::{AppConfig, Goal, Overrides, Terminal};
use bucketdrop_cloud::{GcsFactory, GoogleIdentity};
use bucketdrop_flow::{create_flow, PreselectPolicy, UploadFlowController};
use bucketdrop_prefs::PreferenceStore;
use bucketdrop_types::{FileRef, ShareIntent};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bucketdrop")]
#[command(about = "Share a file into a Google Cloud Storage bucket")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Cloud project whose buckets are listed
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// OAuth client ID
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, global = true)]
    client_secret: Option<String>,

    /// Path to the preference database
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    /// Send the file's bytes instead of only announcing the upload
    #[arg(long, global = true)]
    transfer: bool,

    /// Upload into the remembered bucket without asking
    #[arg(long, global = true)]
    upload_on_restore: bool,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a file (path or URI) into a bucket
    Share {
        file: String,

        /// Bucket to upload into, skipping the prompt
        #[arg(short, long)]
        bucket: Option<String>,
    },
    /// Sign in and pick the bucket to remember
    Launch,
    /// Forget the signed-in Google account
    SignOut,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = AppConfig::load(args.config.as_deref())?.with_overrides(Overrides {
        project_id: args.project,
        client_id: args.client_id,
        client_secret: args.client_secret,
        prefs_path: args.prefs,
        transfer: args.transfer,
        upload_on_restore: args.upload_on_restore,
    });
    if config.google.client_id.is_empty() {
        warn!("No OAuth client id configured; Google sign-in will fail");
    }

    let prefs_path = config.prefs_path()?;
    let store = PreferenceStore::new(&prefs_path)
        .with_context(|| format!("Failed to open preferences at {}", prefs_path.display()))?;
    info!("Using preferences at {}", prefs_path.display());

    let identity = Arc::new(GoogleIdentity::new(config.google.clone(), &store)?);
    let storage = Arc::new(GcsFactory::new(config.google.clone()));
    let controller = UploadFlowController::new(config.flow.clone(), &store);
    let (orchestrator, handle, mut updates) = create_flow(controller, identity, storage);
    let flow = tokio::spawn(orchestrator.run());

    let goal = match args.command {
        Command::Share { file, bucket } => {
            let file = FileRef::parse(&file).context("Invalid file reference")?;
            handle.launch(ShareIntent::send(file)).await?;
            Goal::Upload { bucket }
        }
        Command::Launch => {
            handle.launch(ShareIntent::main()).await?;
            Goal::PickBucket
        }
        Command::SignOut => {
            handle.sign_out().await?;
            Goal::SignOut
        }
    };

    let stdin = BufReader::new(tokio::io::stdin());
    let mut terminal = Terminal::new(stdin, std::io::stdout(), goal)
        .upload_on_restore(config.flow.preselect_policy == PreselectPolicy::FireHandler);
    let result = terminal.run(&handle, &mut updates).await;

    if let Err(e) = handle.shutdown().await {
        debug!("Upload flow already stopped: {e}");
    }
    flow.await.context("Upload flow panicked")?;

    result
}
