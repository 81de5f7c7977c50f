#![forbid(unsafe_code)]

//! Dismiss-trigger resolution.
//!
//! Decides whether an input event is a close request and, if so, where it
//! came from. The result travels in the cancelable `close-requested` event
//! so listeners can treat, say, an accidental backdrop click differently
//! from an explicit close button press.
//!
//! | Trigger | Source | Suppressed by `no_close_on_backdrop` |
//! |---------|--------|--------------------------------------|
//! | Click whose original target is the backdrop | `Overlay` | yes |
//! | Escape keydown | `Keyboard` | yes |
//! | Click on (or inside) the built-in close button | `CloseButton` | no |
//! | Any programmatic `close()` | `Method` | no |

use std::fmt;

use veil_core::{ClickEvent, Document, KeyEvent, MouseButton};

use crate::modal::container::{ModalConfig, ModalParts, ModalRegion};

/// Provenance of a close attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DismissSource {
    /// Backdrop click.
    Overlay,
    /// Escape key.
    Keyboard,
    /// Built-in close button.
    CloseButton,
    /// Programmatic call.
    Method,
}

impl DismissSource {
    /// Wire name carried in the event payload.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overlay => "overlay",
            Self::Keyboard => "keyboard",
            Self::CloseButton => "close-button",
            Self::Method => "method",
        }
    }
}

impl fmt::Display for DismissSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a click into a close request.
pub fn resolve_click(
    doc: &Document,
    parts: &ModalParts,
    config: &ModalConfig,
    click: &ClickEvent,
) -> Option<DismissSource> {
    if click.button != MouseButton::Primary {
        return None;
    }
    match parts.region(doc, click.target) {
        ModalRegion::Backdrop if !config.no_close_on_backdrop => Some(DismissSource::Overlay),
        ModalRegion::CloseButton => Some(DismissSource::CloseButton),
        ModalRegion::Backdrop | ModalRegion::Panel | ModalRegion::Outside => None,
    }
}

/// Resolve a key press into a close request.
pub fn resolve_key(config: &ModalConfig, key: &KeyEvent) -> Option<DismissSource> {
    (key.is_escape() && !config.no_close_on_backdrop).then_some(DismissSource::Keyboard)
}
