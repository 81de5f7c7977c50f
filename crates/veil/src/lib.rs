#![forbid(unsafe_code)]

//! Veil public facade crate.
//!
//! Re-exports the document model, runtime, accessibility layer and the
//! modal subsystem, plus a prelude for the common path.
//!
//! # Example
//!
//! ```
//! use veil::prelude::*;
//!
//! let doc = Document::new();
//! let backdrop = doc.append_new(doc.body(), "div").unwrap();
//! let panel = doc.append_new(doc.body(), "div").unwrap();
//! doc.append_new(panel, "button").unwrap();
//!
//! let parts = ModalParts::new(panel, backdrop);
//! let mut modal = ModalController::new(doc.clone(), parts, ModalConfig::default());
//! modal.show();
//! modal.tick(Duration::from_millis(250));
//! assert_eq!(modal.state(), ModalState::Open);
//! ```

pub use veil_a11y;
pub use veil_core;
pub use veil_runtime;
pub use veil_widgets;

pub use veil_core::{ClickEvent, Document, ElementId, Event, KeyCode, KeyEvent, Modifiers};
pub use veil_runtime::Duration;
pub use veil_widgets::modal;

pub mod prelude {
    pub use crate::{
        ClickEvent, Document, Duration, ElementId, Event, KeyCode, KeyEvent, Modifiers,
    };

    pub use veil_a11y::{Politeness, ScreenReaderAnnouncer};
    pub use veil_widgets::modal::{
        DismissSource, ModalConfig, ModalController, ModalEvent, ModalEventKind, ModalParts,
        ModalRemote, ModalStack, ModalState, Outcome, ScrollLock, ScrollLockService,
    };
}
