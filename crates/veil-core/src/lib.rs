#![forbid(unsafe_code)]

//! Host model for Veil: the document tree, input events, and focus queries
//! that the modal lifecycle core is driven by.

pub mod dom;
pub mod event;
pub mod focus;

pub use dom::{Document, DomError, ElementId, KeyListenerId, ScrollHold};
pub use event::{
    ClickEvent, Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, TabDirection,
};
pub use focus::{TabIndex, find_focusable, is_focusable, is_tabbable};
