#![forbid(unsafe_code)]

//! Keyboard focus containment.
//!
//! While a [`FocusTrap`] is active, Tab and Shift+Tab cycle through the
//! tabbable descendants of its container and never leave it: Tab on the
//! last element wraps to the first, Shift+Tab on the first wraps to the
//! last.
//!
//! # Invariants
//!
//! - At most one [`FocusTrapHandle`] per trap. Activating an active trap
//!   fails with [`FocusTrapError::AlreadyActive`].
//! - The focusable list is recomputed on every Tab press, so elements
//!   added or disabled while the trap is active are honoured.
//! - The element to restore lies outside the container. Focus that was
//!   already inside at activation (autofocus) is kept but never recorded.
//! - On deactivation, focus returns to the recorded element if it is still
//!   connected; otherwise focus is cleared. Focus that has already moved
//!   into another container is left where it is.
//!
//! # Failure Modes
//!
//! - Container without tabbable descendants: the container receives
//!   `tabindex="-1"` and is focused itself. The attribute is removed again
//!   on deactivation.
//! - `deactivate()` on an inactive trap is a no-op.

use veil_core::{Document, ElementId, KeyEvent, TabDirection, find_focusable};

/// Move focus, tracing when the target refuses it.
fn move_focus(doc: &Document, target: ElementId) -> bool {
    match doc.focus(target) {
        Ok(true) => true,
        Ok(false) => {
            tracing::trace!(target: "veil::focus", element = %target, "focus refused");
            false
        }
        Err(err) => {
            tracing::trace!(target: "veil::focus", element = %target, %err, "focus failed");
            false
        }
    }
}

/// Errors from [`FocusTrap::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FocusTrapError {
    /// A handle is already active for this trap.
    #[error("focus trap already active on {0}")]
    AlreadyActive(ElementId),
    /// The container is not attached to the document.
    #[error("focus trap container {0} is not connected")]
    Detached(ElementId),
}

/// State owned by an active trap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTrapHandle {
    container: ElementId,
    restore_to: Option<ElementId>,
    focusables: Vec<ElementId>,
    made_focusable: bool,
}

impl FocusTrapHandle {
    /// The trapped container.
    pub fn container(&self) -> ElementId {
        self.container
    }

    /// Element focused before activation.
    pub fn restore_to(&self) -> Option<ElementId> {
        self.restore_to
    }

    /// Tabbable descendants as of the last refresh.
    pub fn focusables(&self) -> &[ElementId] {
        &self.focusables
    }
}

/// Focus trap over a single container at a time.
#[derive(Debug)]
pub struct FocusTrap {
    document: Document,
    handle: Option<FocusTrapHandle>,
}

impl FocusTrap {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            handle: None,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&FocusTrapHandle> {
        self.handle.as_ref()
    }

    /// Trap focus inside `container` and move focus into it.
    ///
    /// The currently focused element is restored on deactivation unless it
    /// is inside `container`.
    pub fn activate(&mut self, container: ElementId) -> Result<(), FocusTrapError> {
        let current = self.document.active_element();
        self.activate_returning_to(container, current)
    }

    /// [`FocusTrap::activate`] with an explicit element to restore, usually
    /// the one focused when the surface was asked to open.
    pub fn activate_returning_to(
        &mut self,
        container: ElementId,
        restore_to: Option<ElementId>,
    ) -> Result<(), FocusTrapError> {
        if let Some(handle) = &self.handle {
            return Err(FocusTrapError::AlreadyActive(handle.container));
        }
        if !self.document.is_connected(container) {
            return Err(FocusTrapError::Detached(container));
        }

        let doc = &self.document;
        let restore_to = restore_to.filter(|&el| !doc.contains(container, el));
        let focusables = find_focusable(doc, container);
        let mut made_focusable = false;

        let focused = doc.active_element();
        match focusables.first() {
            // Keep focus where it is if it already landed inside (autofocus).
            Some(_) if focused.is_some_and(|el| focusables.contains(&el)) => {}
            Some(&first) => {
                move_focus(doc, first);
            }
            None => {
                if !doc.has_attribute(container, "tabindex") {
                    made_focusable = doc.set_attribute(container, "tabindex", "-1").is_ok();
                }
                move_focus(doc, container);
            }
        }

        tracing::trace!(
            target: "veil::focus",
            container = %container,
            focusables = focusables.len(),
            made_focusable,
            "focus trap activated"
        );
        self.handle = Some(FocusTrapHandle {
            container,
            restore_to,
            focusables,
            made_focusable,
        });
        Ok(())
    }

    /// Change the element focus returns to on deactivation.
    ///
    /// Returns whether the trap is active. Elements inside the container
    /// are not recorded.
    pub fn set_restore_to(&mut self, restore_to: Option<ElementId>) -> bool {
        let doc = &self.document;
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };
        handle.restore_to = restore_to.filter(|&el| !doc.contains(handle.container, el));
        true
    }

    /// Release the trap and restore focus. Returns whether it was active.
    pub fn deactivate(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        let doc = &self.document;
        if handle.made_focusable {
            doc.remove_attribute(handle.container, "tabindex");
        }
        let holds_focus = doc
            .active_element()
            .is_none_or(|el| doc.contains(handle.container, el));
        let restored = match handle.restore_to {
            Some(el) if holds_focus && doc.is_connected(el) => move_focus(doc, el),
            _ => false,
        };
        if holds_focus && !restored {
            doc.blur();
        }
        tracing::trace!(
            target: "veil::focus",
            container = %handle.container,
            holds_focus,
            restored,
            "focus trap deactivated"
        );
        true
    }

    /// Intercept Tab / Shift+Tab. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let Some(direction) = key.tab_direction() else {
            return false;
        };
        let doc = self.document.clone();
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };
        handle.focusables = find_focusable(&doc, handle.container);

        let Some((&first, &last)) = handle.focusables.first().zip(handle.focusables.last()) else {
            move_focus(&doc, handle.container);
            return true;
        };

        let current = doc
            .active_element()
            .and_then(|el| handle.focusables.iter().position(|&f| f == el));
        let target = match (direction, current) {
            (TabDirection::Forward, None) => first,
            (TabDirection::Backward, None) => last,
            (TabDirection::Forward, Some(i)) => {
                handle.focusables.get(i + 1).copied().unwrap_or(first)
            }
            (TabDirection::Backward, Some(0)) => last,
            (TabDirection::Backward, Some(i)) => handle.focusables[i - 1],
        };
        move_focus(&doc, target);
        true
    }
}
