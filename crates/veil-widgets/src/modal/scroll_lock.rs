#![forbid(unsafe_code)]

//! Document scroll suspension.
//!
//! [`ScrollLock`] pins the document viewport on first acquisition and
//! restores the exact prior offset on final release. Holds are counted by
//! the document itself, so every lock over the same [`Document`] shares one
//! count: overlapping modals keep scrolling suspended until the last of
//! them lets go, whether or not they were created together.
//!
//! # Invariants
//!
//! - The offset recorded by the first acquire wins; nested acquires never
//!   overwrite it.
//! - Each [`ScrollLockToken`] releases at most once (tokens are move-only).
//! - Releasing a token the document does not know (foreign or stale) is a
//!   no-op.

use veil_core::Document;

/// Proof of a held scroll lock.
///
/// Deliberately neither `Clone` nor `Copy`: handing the token back to
/// [`ScrollLockService::release`] consumes it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a token without releasing it keeps the document pinned"]
pub struct ScrollLockToken {
    id: u64,
    offset: i32,
}

impl ScrollLockToken {
    /// Build a token. Intended for [`ScrollLockService`] implementations.
    pub fn new(id: u64, offset: i32) -> Self {
        Self { id, offset }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Scroll offset recorded when the lock was first taken.
    pub fn offset(&self) -> i32 {
        self.offset
    }
}

/// Scroll suspension as seen by a modal controller.
pub trait ScrollLockService {
    /// Suspend scrolling and return a token for the hold.
    fn acquire(&mut self) -> ScrollLockToken;

    /// Give a hold back. Unknown tokens are ignored.
    fn release(&mut self, token: ScrollLockToken);

    /// Number of outstanding holds.
    fn holders(&self) -> usize;

    /// Whether scrolling is currently suspended.
    fn is_locked(&self) -> bool {
        self.holders() > 0
    }
}

/// Reference-counted scroll lock over a [`Document`].
///
/// Any two locks over the same document are the same lock.
#[derive(Debug, Clone)]
pub struct ScrollLock {
    document: Document,
}

impl ScrollLock {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Whether two handles refer to the same lock.
    pub fn same_lock(&self, other: &ScrollLock) -> bool {
        self.document.same_document(&other.document)
    }

    /// Offset that will be restored on final release, while locked.
    pub fn saved_offset(&self) -> Option<i32> {
        self.document.pinned_offset()
    }
}

impl ScrollLockService for ScrollLock {
    fn acquire(&mut self) -> ScrollLockToken {
        let hold = self.document.hold_scroll();
        if self.document.scroll_holds() == 1 {
            tracing::trace!(target: "veil::scroll", offset = hold.offset, "scroll locked");
        }
        ScrollLockToken::new(hold.id, hold.offset)
    }

    fn release(&mut self, token: ScrollLockToken) {
        if !self.document.release_scroll(token.id) {
            tracing::trace!(target: "veil::scroll", token = token.id, "stale token ignored");
            return;
        }
        if self.document.scroll_holds() == 0 {
            tracing::trace!(target: "veil::scroll", offset = token.offset, "scroll unlocked");
        }
    }

    fn holders(&self) -> usize {
        self.document.scroll_holds()
    }
}
