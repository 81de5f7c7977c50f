#![forbid(unsafe_code)]

//! Modal lifecycle phases.
//!
//! State machine: Closed → Opening → Open → Closing → Closed
//!
//! `Opening` and `Closing` last one animation window. A close request may
//! cut an `Opening` phase short, and a show request may reverse a
//! `Closing` phase. Teardown jumps straight to `Closed`.

use std::fmt;

/// Current phase of a modal surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModalState {
    /// Not rendered; no resources held.
    #[default]
    Closed,
    /// Show accepted, entrance animation running.
    Opening,
    /// Fully shown.
    Open,
    /// Close accepted, exit animation running.
    Closing,
}

impl ModalState {
    /// Whether the surface should be rendered.
    #[inline]
    pub fn is_visible(self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Whether an animation window is running.
    #[inline]
    pub fn is_transitioning(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    /// Logical value of the `open` property.
    #[inline]
    pub fn is_open_intent(self) -> bool {
        matches!(self, Self::Opening | Self::Open)
    }

    /// Whether `show()` would start a transition from this phase.
    #[inline]
    pub fn accepts_show(self) -> bool {
        matches!(self, Self::Closed | Self::Closing)
    }

    /// Whether `close()` would request a transition from this phase.
    #[inline]
    pub fn accepts_close(self) -> bool {
        matches!(self, Self::Opening | Self::Open)
    }

    /// Lowercase name used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for ModalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
