//! Inbound intents delivered by the host platform.

use crate::FileRef;
use serde::{Deserialize, Serialize};

/// The action an intent asks the application to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    /// Plain launch with nothing attached.
    Main,
    /// A "send" action carrying a single file.
    Send,
}

/// An inbound intent, as received at launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareIntent {
    pub action: IntentAction,
    /// The attached stream. Only meaningful for [`IntentAction::Send`].
    pub stream: Option<FileRef>,
}

impl ShareIntent {
    /// A plain launch intent.
    #[must_use]
    pub fn main() -> Self {
        Self {
            action: IntentAction::Main,
            stream: None,
        }
    }

    /// A send intent carrying `file`.
    #[must_use]
    pub fn send(file: FileRef) -> Self {
        Self {
            action: IntentAction::Send,
            stream: Some(file),
        }
    }

    /// Returns true for send actions.
    pub fn is_send(&self) -> bool {
        self.action == IntentAction::Send
    }

    /// The shared file, if this is a send action that carries one.
    pub fn shared_file(&self) -> Option<&FileRef> {
        if self.is_send() {
            self.stream.as_ref()
        } else {
            None
        }
    }
}

impl Default for ShareIntent {
    fn default() -> Self {
        Self::main()
    }
}
