//! Latest-selection-wins bookkeeping
//!
//! Every new selection (league, date) takes a token with a higher sequence
//! number. A load started under an older token finds out it was superseded
//! and drops its result instead of showing stale data.

use std::sync::atomic::{AtomicU64, Ordering};

/// Proof of which selection a load was started for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionToken(u64);

impl SelectionToken {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: AtomicU64,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new selection, superseding every earlier token
    pub fn begin(&self) -> SelectionToken {
        SelectionToken(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no selection has started since `token` was issued
    pub fn is_current(&self, token: SelectionToken) -> bool {
        self.current.load(Ordering::SeqCst) == token.0
    }
}
