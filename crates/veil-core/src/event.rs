#![forbid(unsafe_code)]

//! Input events delivered by the host to interactive surfaces.

use bitflags::bitflags;

use crate::dom::ElementId;

/// A host input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Keyboard input, dispatched at the document level.
    Key(KeyEvent),
    /// Pointer activation (DOM `click`).
    Click(ClickEvent),
}

/// Keyboard key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Tab,
    /// Shift+Tab as reported by some hosts.
    BackTab,
    Escape,
    Enter,
    Char(char),
}

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// Key press phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A plain key press without modifiers.
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    /// Set modifiers.
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the press phase.
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Press or auto-repeat (keydown).
    #[inline]
    pub fn is_down(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }

    /// Whether this is a Tab keydown, and if so whether it moves backwards.
    pub fn tab_direction(&self) -> Option<TabDirection> {
        if !self.is_down() {
            return None;
        }
        match self.code {
            KeyCode::BackTab => Some(TabDirection::Backward),
            KeyCode::Tab if self.modifiers.contains(Modifiers::SHIFT) => {
                Some(TabDirection::Backward)
            }
            KeyCode::Tab => Some(TabDirection::Forward),
            _ => None,
        }
    }

    /// Whether this is an Escape keydown.
    #[inline]
    pub fn is_escape(&self) -> bool {
        self.is_down() && self.code == KeyCode::Escape
    }
}

/// Direction of sequential focus navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabDirection {
    Forward,
    Backward,
}

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Primary,
    Auxiliary,
    Secondary,
}

/// A click event.
///
/// `target` is the original target (the innermost element under the
/// pointer), not the element the listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: ElementId,
    pub button: MouseButton,
}

impl ClickEvent {
    /// Primary-button click on `target`.
    pub const fn new(target: ElementId) -> Self {
        Self {
            target,
            button: MouseButton::Primary,
        }
    }
}

impl From<KeyEvent> for Event {
    fn from(key: KeyEvent) -> Self {
        Self::Key(key)
    }
}

impl From<ClickEvent> for Event {
    fn from(click: ClickEvent) -> Self {
        Self::Click(click)
    }
}
