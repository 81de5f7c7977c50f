#![forbid(unsafe_code)]

//! Widgets for Veil.
//!
//! Currently the modal subsystem; see [`modal`].

pub mod modal;
