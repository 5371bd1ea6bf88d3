//! Pending remote writes

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What needs to be re-pushed to the remote tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SyncToken {
    /// The statistics snapshot
    Statistics,
}

/// Set of pending sync tokens. Enqueueing a token twice has no extra effect.
#[derive(Debug, Default, Clone)]
pub struct SyncQueue {
    pending: BTreeSet<SyncToken>,
}

impl SyncQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token. Returns false if it was already queued.
    pub fn enqueue(&mut self, token: SyncToken) -> bool {
        self.pending.insert(token)
    }

    /// Remove and return every pending token.
    pub fn take_all(&mut self) -> Vec<SyncToken> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Pending tokens in a stable order.
    pub fn tokens(&self) -> impl Iterator<Item = SyncToken> + '_ {
        self.pending.iter().copied()
    }

    pub fn contains(&self, token: SyncToken) -> bool {
        self.pending.contains(&token)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
