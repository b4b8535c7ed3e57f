//! Token identity.
//!
//! A `TokenId` addresses one token in the stream for removal and replacement.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT_TOKEN_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a token.
///
/// Ids are drawn from a process-wide counter, so an id is never handed out
/// twice and never recycled after its token is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TokenId(u64);

impl TokenId {
    /// Mint a new, never-before-seen id.
    #[inline]
    pub fn fresh() -> Self {
        Self(NEXT_TOKEN_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tok-{}", self.0)
    }
}
