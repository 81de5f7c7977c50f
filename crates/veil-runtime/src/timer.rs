#![forbid(unsafe_code)]

//! Tagged one-shot timers on a host-driven virtual clock.
//!
//! A [`Scheduler`] replaces ad-hoc `setTimeout` chains. Every timer carries
//! a tag; scheduling a timer whose tag is already pending cancels the older
//! one, so "at most one pending timer per tag" holds by construction rather
//! than by convention.
//!
//! The clock only moves when the host calls [`Scheduler::advance`] (or the
//! [`Scheduler::pop_due`] / [`Scheduler::settle`] pair). Nothing fires
//! behind the caller's back, which keeps lifecycle code deterministic and
//! testable.
//!
//! # Invariants
//!
//! 1. At most one pending timer per tag.
//! 2. Due timers fire in `(deadline, scheduling order)` order.
//! 3. While draining with `pop_due`, `now()` equals the deadline of the
//!    timer just popped, so timers scheduled from a handler are measured
//!    from the moment their predecessor fired.
//! 4. The clock never moves backwards.
//!
//! # Example
//!
//! ```
//! use veil_runtime::Scheduler;
//! use web_time::Duration;
//!
//! let mut timers = Scheduler::new();
//! timers.schedule(Duration::from_millis(200), "animation");
//! timers.schedule(Duration::from_millis(100), "animation"); // replaces
//! assert_eq!(timers.len(), 1);
//! assert!(timers.advance(Duration::from_millis(99)).is_empty());
//! assert_eq!(timers.advance(Duration::from_millis(1)), vec!["animation"]);
//! ```

use std::fmt;
use std::hash::Hash;

use ahash::AHashMap;
use web_time::Duration;

#[derive(Debug, Clone, Copy)]
struct Pending {
    deadline: Duration,
    seq: u64,
}

/// One-shot timers keyed by tag.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: Duration,
    next_seq: u64,
    pending: AHashMap<T, Pending>,
}

impl<T> Default for Scheduler<T>
where
    T: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T>
where
    T: Eq + Hash + Clone + fmt::Debug,
{
    /// Create a scheduler with its clock at zero.
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: AHashMap::new(),
        }
    }

    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedule `tag` to fire after `delay`.
    ///
    /// Returns `true` if a pending timer with the same tag was replaced.
    pub fn schedule(&mut self, delay: Duration, tag: T) -> bool {
        let deadline = self.now.saturating_add(delay);
        let seq = self.next_seq;
        self.next_seq += 1;
        let replaced = self.pending.insert(tag.clone(), Pending { deadline, seq });
        tracing::trace!(
            target: "veil::timer",
            tag = ?tag,
            delay_ms = delay.as_millis() as u64,
            replaced = replaced.is_some(),
            "timer scheduled"
        );
        replaced.is_some()
    }

    /// Cancel a pending timer. Returns whether one was pending.
    pub fn cancel(&mut self, tag: &T) -> bool {
        let cancelled = self.pending.remove(tag).is_some();
        if cancelled {
            tracing::trace!(target: "veil::timer", tag = ?tag, "timer cancelled");
        }
        cancelled
    }

    /// Cancel every pending timer. Returns how many were pending.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Remove every pending timer without moving the clock, returning the
    /// tags in the order they would have fired.
    pub fn drain(&mut self) -> Vec<T> {
        let mut all: Vec<(T, Pending)> = self.pending.drain().collect();
        all.sort_by_key(|(_, p)| (p.deadline, p.seq));
        all.into_iter().map(|(tag, _)| tag).collect()
    }

    /// Whether a timer with this tag is pending.
    pub fn is_pending(&self, tag: &T) -> bool {
        self.pending.contains_key(tag)
    }

    /// Time left until the tagged timer fires.
    pub fn remaining(&self, tag: &T) -> Option<Duration> {
        self.pending
            .get(tag)
            .map(|p| p.deadline.saturating_sub(self.now))
    }

    /// Number of pending timers.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no timers are pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deadline of the earliest pending timer, relative to now.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending
            .values()
            .map(|p| p.deadline)
            .min()
            .map(|deadline| deadline.saturating_sub(self.now))
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline.
    ///
    /// Use with [`Scheduler::settle`] when handlers may schedule new timers:
    ///
    /// ```
    /// # use veil_runtime::Scheduler;
    /// # use web_time::Duration;
    /// # let mut timers: Scheduler<u8> = Scheduler::new();
    /// let until = timers.now() + Duration::from_millis(16);
    /// while let Some(tag) = timers.pop_due(until) {
    ///     // handle `tag`; may call `timers.schedule(..)`
    ///     let _ = tag;
    /// }
    /// timers.settle(until);
    /// ```
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        let (tag, pending) = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= until)
            .min_by_key(|(_, p)| (p.deadline, p.seq))
            .map(|(tag, p)| (tag.clone(), *p))?;
        self.pending.remove(&tag);
        self.now = self.now.max(pending.deadline);
        tracing::trace!(
            target: "veil::timer",
            tag = ?tag,
            at_ms = self.now.as_millis() as u64,
            "timer fired"
        );
        Some(tag)
    }

    /// Move the clock forward to `until` (never backwards).
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Advance the clock by `elapsed` and return every timer that came due,
    /// in firing order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        let until = self.now.saturating_add(elapsed);
        let mut fired = Vec::new();
        while let Some(tag) = self.pop_due(until) {
            fired.push(tag);
        }
        self.settle(until);
        fired
    }
}
