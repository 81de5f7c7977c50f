#![forbid(unsafe_code)]

//! Modal surface configuration and the element parts the rendering layer
//! hands to the controller.
//!
//! The rendering layer draws:
//! 1) a full-viewport backdrop (overlay), then
//! 2) the dialog panel, optionally with a built-in close button.
//!
//! and reports the resulting elements as [`ModalParts`]. Clicks are then
//! classified against those parts with [`ModalParts::region`].

use veil_a11y::Politeness;
use veil_core::{Document, ElementId};
use web_time::Duration;

/// Default animation window, matching the CSS transition of the surface.
pub const DEFAULT_ANIMATION_DURATION: Duration = Duration::from_millis(250);

/// Region of the modal surface an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalRegion {
    /// Exactly the backdrop element.
    Backdrop,
    /// The built-in close button or anything inside it (the glyph).
    CloseButton,
    /// The panel or any of its other descendants.
    Panel,
    /// Outside the surface.
    Outside,
}

/// Elements making up a rendered modal surface.
///
/// Invariants:
/// - `panel` and `backdrop` are distinct elements.
/// - `close_button`, when present, lies inside `panel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalParts {
    /// The dialog panel: focus is trapped inside it.
    pub panel: ElementId,
    /// The overlay behind the panel.
    pub backdrop: ElementId,
    /// Built-in close button, absent when `no_close_button` is set.
    pub close_button: Option<ElementId>,
}

impl ModalParts {
    /// Parts without a close button.
    pub const fn new(panel: ElementId, backdrop: ElementId) -> Self {
        Self {
            panel,
            backdrop,
            close_button: None,
        }
    }

    /// Attach the built-in close button.
    pub const fn with_close_button(mut self, close_button: ElementId) -> Self {
        self.close_button = Some(close_button);
        self
    }

    /// Classify a click target.
    ///
    /// Only the backdrop element itself counts as [`ModalRegion::Backdrop`];
    /// descendants of the backdrop are classified by their own position.
    pub fn region(&self, doc: &Document, target: ElementId) -> ModalRegion {
        if target == self.backdrop {
            return ModalRegion::Backdrop;
        }
        if let Some(close) = self.close_button
            && doc.contains(close, target)
        {
            return ModalRegion::CloseButton;
        }
        if doc.contains(self.panel, target) {
            ModalRegion::Panel
        } else {
            ModalRegion::Outside
        }
    }
}

#[cfg(feature = "serde")]
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use web_time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Modal configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ModalConfig {
    /// Ignore backdrop clicks and Escape.
    pub no_close_on_backdrop: bool,
    /// Do not render the built-in close button. Rendering only.
    pub no_close_button: bool,
    /// Animation window for both entrance and exit.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "animationDurationMs", with = "duration_ms")
    )]
    pub animation_duration: Duration,
    /// Accessible label, used in announcements.
    pub label: Option<String>,
    /// Announce open/close to assistive technology.
    pub announce: bool,
    /// Politeness of lifecycle announcements.
    pub politeness: Politeness,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            no_close_on_backdrop: false,
            no_close_button: false,
            animation_duration: DEFAULT_ANIMATION_DURATION,
            label: None,
            announce: true,
            politeness: Politeness::Polite,
        }
    }
}

impl ModalConfig {
    pub fn no_close_on_backdrop(mut self, value: bool) -> Self {
        self.no_close_on_backdrop = value;
        self
    }

    pub fn no_close_button(mut self, value: bool) -> Self {
        self.no_close_button = value;
        self
    }

    pub fn animation_duration(mut self, duration: Duration) -> Self {
        self.animation_duration = duration;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn announce(mut self, announce: bool) -> Self {
        self.announce = announce;
        self
    }

    pub fn politeness(mut self, politeness: Politeness) -> Self {
        self.politeness = politeness;
        self
    }

    /// Message announced after the entrance animation.
    pub fn opened_message(&self) -> String {
        match self.label.as_deref() {
            Some(label) => format!("{label} dialog opened"),
            None => "Dialog opened".to_owned(),
        }
    }

    /// Message announced after the exit animation.
    pub fn closed_message(&self) -> String {
        match self.label.as_deref() {
            Some(label) => format!("{label} dialog closed"),
            None => "Dialog closed".to_owned(),
        }
    }
}
