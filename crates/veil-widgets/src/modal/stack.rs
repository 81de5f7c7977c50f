#![forbid(unsafe_code)]

//! Modal stack for overlapping modals.
//!
//! The `ModalStack` keeps several [`ModalController`]s in LIFO order over
//! one document. All of them share a single [`ScrollLock`], so scrolling
//! stays suspended while any of them still holds it.
//!
//! # Invariants
//!
//! - Later modals are always on top.
//! - Only the topmost open (or opening) modal receives input events. A
//!   modal playing its exit animation has released focus and passes input
//!   down.
//! - `tick` drives every modal; a modal is pruned once it is closed and
//!   its announcements have retired.
//! - Closing a covered modal never moves focus out of the modal above it.
//!   Its return target is handed up instead, so focus unwinds through the
//!   layers that are still open.
//!
//! # Failure Modes
//!
//! - `close_top()` on an empty stack returns `false` (no panic).
//! - `get()` / `get_mut()` for a pruned or unknown ID return `None`.
//!
//! # Example
//!
//! ```ignore
//! let mut stack = ModalStack::new(document.clone());
//!
//! let settings = stack.open(settings_parts, ModalConfig::default());
//! let confirm = stack.open(confirm_parts, ModalConfig::default());
//!
//! // Only `confirm` sees this Escape.
//! stack.handle_event(&KeyEvent::new(KeyCode::Escape).into());
//! stack.tick(Duration::from_millis(250));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use veil_core::{Document, Event};
use web_time::Duration;

use crate::modal::container::{ModalConfig, ModalParts};
use crate::modal::controller::ModalController;
use crate::modal::scroll_lock::{ScrollLock, ScrollLockService};

/// Global counter for unique modal IDs.
static MODAL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a modal in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalId(u64);

impl ModalId {
    fn new() -> Self {
        Self(MODAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct ActiveModal {
    id: ModalId,
    controller: ModalController<ScrollLock>,
}

/// Stack of modal controllers sharing one scroll lock.
#[derive(Debug)]
pub struct ModalStack {
    document: Document,
    scroll: ScrollLock,
    modals: Vec<ActiveModal>,
}

impl ModalStack {
    pub fn new(document: Document) -> Self {
        Self {
            scroll: ScrollLock::new(document.clone()),
            document,
            modals: Vec::new(),
        }
    }

    // --- Stack Operations ---

    /// Create a controller on top of the stack and show it.
    pub fn open(&mut self, parts: ModalParts, config: ModalConfig) -> ModalId {
        let mut controller = ModalController::with_scroll_lock(
            self.document.clone(),
            parts,
            config,
            self.scroll.clone(),
        );
        controller.show();
        let id = ModalId::new();
        tracing::debug!(
            target: "veil::modal",
            id = id.id(),
            depth = self.modals.len() + 1,
            "modal pushed"
        );
        self.modals.push(ActiveModal { id, controller });
        id
    }

    /// Request a close of the modal receiving input.
    ///
    /// Returns `true` if it accepted the close.
    pub fn close_top(&mut self) -> bool {
        let Some(top) = self.top_mut() else {
            return false;
        };
        let before = top.state();
        top.close();
        top.state() != before
    }

    /// Request a programmatic close of a specific modal.
    pub fn close(&mut self, id: ModalId) -> bool {
        let Some(modal) = self.get_mut(id) else {
            return false;
        };
        let before = modal.state();
        modal.close();
        let accepted = modal.state() != before;
        self.hand_up_focus_returns();
        accepted
    }

    pub fn get(&self, id: ModalId) -> Option<&ModalController> {
        self.modals
            .iter()
            .find(|m| m.id == id)
            .map(|m| &m.controller)
    }

    pub fn get_mut(&mut self, id: ModalId) -> Option<&mut ModalController> {
        self.modals
            .iter_mut()
            .find(|m| m.id == id)
            .map(|m| &mut m.controller)
    }

    // --- State Queries ---

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.modals.is_empty()
    }

    /// Number of modals in the stack, including ones still animating out.
    #[inline]
    pub fn depth(&self) -> usize {
        self.modals.len()
    }

    pub fn contains(&self, id: ModalId) -> bool {
        self.modals.iter().any(|m| m.id == id)
    }

    /// ID of the modal receiving input.
    pub fn top_id(&self) -> Option<ModalId> {
        self.modals
            .iter()
            .rev()
            .find(|m| m.controller.is_open())
            .map(|m| m.id)
    }

    /// The lock shared by every modal in the stack.
    pub fn scroll_lock(&self) -> &ScrollLock {
        &self.scroll
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll.is_locked()
    }

    // --- Event Handling ---

    /// Route an event to the modal receiving input only.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        let consumed = match self.top_mut() {
            Some(top) => top.handle_event(event),
            None => false,
        };
        self.hand_up_focus_returns();
        consumed
    }

    /// Drive every modal and prune the ones that are done.
    ///
    /// Returns the IDs removed by this tick, bottom first.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<ModalId> {
        for modal in &mut self.modals {
            modal.controller.tick(elapsed);
        }
        self.hand_up_focus_returns();
        let mut pruned = Vec::new();
        self.modals.retain(|m| {
            let done =
                !m.controller.state().is_visible() && m.controller.pending_timers() == 0;
            if done {
                pruned.push(m.id);
            }
            !done
        });
        if !pruned.is_empty() {
            tracing::debug!(
                target: "veil::modal",
                pruned = pruned.len(),
                depth = self.modals.len(),
                "modals pruned"
            );
        }
        pruned
    }

    /// Tear down every modal, top first. Returns how many were removed.
    pub fn unmount_all(&mut self) -> usize {
        let count = self.modals.len();
        while let Some(mut modal) = self.modals.pop() {
            modal.controller.unmount();
        }
        count
    }

    /// Give each modal that is no longer open a chance to pass its return
    /// target to the nearest open modal above, when that modal would
    /// otherwise return focus into the closing panel. Runs top-down so a
    /// run of closing layers collapses onto the one below them.
    fn hand_up_focus_returns(&mut self) {
        for i in (0..self.modals.len()).rev() {
            let (lower, upper) = self.modals.split_at_mut(i + 1);
            let closing = &lower[i].controller;
            if closing.is_open() {
                continue;
            }
            let Some(above) = upper.iter_mut().find(|m| m.controller.is_open()) else {
                continue;
            };
            let panel = closing.parts().panel;
            let returns_into_closing = above
                .controller
                .return_focus()
                .is_some_and(|el| self.document.contains(panel, el));
            if returns_into_closing {
                tracing::trace!(
                    target: "veil::modal",
                    from = lower[i].id.id(),
                    to = above.id.id(),
                    "focus return handed up"
                );
                above.controller.set_return_focus(closing.return_focus());
            }
        }
    }

    fn top_mut(&mut self) -> Option<&mut ModalController> {
        self.modals
            .iter_mut()
            .rev()
            .find(|m| m.controller.is_open())
            .map(|m| &mut m.controller)
    }
}

impl Drop for ModalStack {
    fn drop(&mut self) {
        self.unmount_all();
    }
}
