#![forbid(unsafe_code)]

//! Modal dialog lifecycle: state machine, focus containment, scroll
//! suspension, dismissal and cancelable lifecycle events.
//!
//! # Lifecycle
//!
//! [`ModalController`] drives one surface through
//! `Closed → Opening → Open → Closing → Closed`, timing both animation
//! windows on a host-driven clock (`tick(elapsed)`).
//!
//! # Focus
//!
//! - **Focus trap**: Tab and Shift+Tab wrap inside the panel ([`FocusTrap`])
//! - **Focus restore**: the element focused before `show()` gets focus back
//! - **Empty panels**: the panel itself becomes focusable
//!
//! # Dismissal
//!
//! Backdrop clicks, Escape and the close button resolve to a
//! [`DismissSource`], carried by the cancelable `close-requested` event.
//! A listener vetoes the close with `prevent_default()`.
//!
//! # Example
//!
//! ```ignore
//! use veil_widgets::modal::{ModalConfig, ModalController, ModalEventKind, ModalParts};
//!
//! let mut modal = ModalController::new(doc.clone(), ModalParts::new(panel, backdrop), ModalConfig::default());
//! modal.subscribe(|event| {
//!     if event.kind() == ModalEventKind::CloseRequested && unsaved_changes() {
//!         event.prevent_default();
//!     }
//! });
//! modal.show();
//! modal.tick(Duration::from_millis(250));
//! ```

mod container;
mod controller;
mod dismiss;
mod event_gate;
mod focus_trap;
mod scroll_lock;
mod stack;
mod state;

pub use container::{DEFAULT_ANIMATION_DURATION, ModalConfig, ModalParts, ModalRegion};
pub use controller::{ESCAPE_LISTENER_LABEL, ModalCommand, ModalController, ModalRemote, TimerTag};
pub use dismiss::{DismissSource, resolve_click, resolve_key};
pub use event_gate::{EventGate, ListenerId, ModalEvent, ModalEventKind, Outcome};
pub use focus_trap::{FocusTrap, FocusTrapError, FocusTrapHandle};
pub use scroll_lock::{ScrollLock, ScrollLockService, ScrollLockToken};
pub use stack::{ModalId, ModalStack};
pub use state::ModalState;
