//! Share-to-bucket upload flow for bucketdrop.
//!
//! # Architecture
//!
//! - **Controller**: a pure state machine. It consumes launch intents,
//!   sign-in results, listing results and selections, and produces
//!   [`Effect`]s. It never performs I/O other than reading and writing the
//!   remembered bucket.
//! - **Orchestrator**: owns the controller on a single task, performs the
//!   effects (sign-in, bucket listing, upload) as background tasks, and feeds
//!   their completions back into the controller on that same task. The
//!   front-end talks to it through a [`FlowHandle`] and receives
//!   [`FlowUpdate`]s.
//!
//! ## Flow
//!
//! 1. **Launch**: a share intent may carry the pending file
//! 2. **Sign-in**: skipped when a cached account exists
//! 3. **Listing**: bucket names for the configured project
//! 4. **Selection**: the remembered bucket is restored, every selection is
//!    remembered, and a selection with a pending file triggers the upload

mod config;
mod controller;
mod error;
mod notification;
mod orchestrator;
mod selector;
pub mod upload;

pub use config::{FlowConfig, PreselectPolicy, UploadMode};
pub use controller::{Effect, FlowState, UploadFlowController};
pub use error::{FlowError, FlowResult};
pub use notification::{Notification, NotificationDuration};
pub use orchestrator::{create_flow, FlowCommand, FlowHandle, FlowOrchestrator, FlowUpdate};
pub use selector::BucketSelector;
pub use upload::{UploadError, UploadOutcome};
