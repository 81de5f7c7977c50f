#![forbid(unsafe_code)]

//! Accessibility layer for Veil.

pub mod announcer;

pub use announcer::{AnnouncerConfig, Politeness, ScreenReaderAnnouncer};
