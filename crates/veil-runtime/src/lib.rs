#![forbid(unsafe_code)]

//! Host-driven runtime pieces for Veil: tagged timers on a virtual clock
//! and a wall-clock adapter for real event loops.

pub mod clock;
pub mod timer;

pub use clock::FrameClock;
pub use timer::Scheduler;

pub use web_time::Duration;
