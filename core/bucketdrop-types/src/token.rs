//! Request tokens for background work.
//!
//! Every background call is tagged with a token. The session counter moves
//! forward whenever the signed-in identity changes, so results that belong to
//! an earlier identity can be dropped; the sequence number orders calls within
//! the whole process lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one background request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestToken {
    session: u64,
    seq: u64,
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}#{}", self.session, self.seq)
    }
}

/// Issues monotonically increasing [`RequestToken`]s.
#[derive(Debug, Default, Clone)]
pub struct TokenSource {
    session: u64,
    next_seq: u64,
}

impl TokenSource {
    /// Creates a source in session 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next token in the current session.
    pub fn next_token(&mut self) -> RequestToken {
        self.next_seq += 1;
        RequestToken {
            session: self.session,
            seq: self.next_seq,
        }
    }

    /// Starts a new session; tokens issued before this are no longer current.
    pub fn begin_session(&mut self) {
        self.session += 1;
    }

    /// Returns true if `token` was issued in the current session.
    pub fn is_current_session(&self, token: RequestToken) -> bool {
        token.session == self.session
    }
}
