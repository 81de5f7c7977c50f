#![forbid(unsafe_code)]

//! Transient screen-reader announcements.
//!
//! [`ScreenReaderAnnouncer::announce`] injects a visually hidden live
//! region into `<body>`, writes the message into it, and schedules the
//! region's removal after [`AnnouncerConfig::linger`] (one second by
//! default): long enough for assistive technology to read it, short enough
//! that stale nodes never pile up.
//!
//! # Invariants
//!
//! - Each call owns exactly one region; removal of one never affects another.
//! - After `linger` has elapsed (or after [`ScreenReaderAnnouncer::flush`]),
//!   no region created by this announcer remains in the document.
//! - Dropping the announcer flushes its regions.
//!
//! # Failure Modes
//!
//! - Empty messages are not announced (`None`).
//! - A region that was already removed by someone else is skipped silently.

use veil_core::{Document, DomError, ElementId};
use veil_runtime::{Duration, Scheduler};

/// `aria-live` politeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Politeness {
    /// Read when the user is idle.
    #[default]
    Polite,
    /// Interrupts the current utterance.
    Assertive,
}

impl Politeness {
    /// Attribute value for `aria-live`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }
}

/// Announcer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncerConfig {
    /// How long a region stays in the document.
    pub linger: Duration,
    /// Default politeness for [`ScreenReaderAnnouncer::announce`].
    pub politeness: Politeness,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            linger: Duration::from_millis(1000),
            politeness: Politeness::Polite,
        }
    }
}

impl AnnouncerConfig {
    /// Set how long regions stay in the document.
    pub fn linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    /// Set the default politeness.
    pub fn politeness(mut self, politeness: Politeness) -> Self {
        self.politeness = politeness;
        self
    }
}

/// Injects and retires live regions in a [`Document`].
#[derive(Debug)]
pub struct ScreenReaderAnnouncer {
    document: Document,
    config: AnnouncerConfig,
    regions: Scheduler<ElementId>,
}

impl ScreenReaderAnnouncer {
    /// Create an announcer with the default configuration.
    pub fn new(document: Document) -> Self {
        Self::with_config(document, AnnouncerConfig::default())
    }

    /// Create an announcer with an explicit configuration.
    pub fn with_config(document: Document, config: AnnouncerConfig) -> Self {
        Self {
            document,
            config,
            regions: Scheduler::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &AnnouncerConfig {
        &self.config
    }

    /// Announce with the configured default politeness.
    pub fn announce(&mut self, message: &str) -> Option<ElementId> {
        self.announce_with(message, self.config.politeness)
    }

    /// Announce with an explicit politeness. Returns the region element.
    pub fn announce_with(&mut self, message: &str, politeness: Politeness) -> Option<ElementId> {
        if message.trim().is_empty() {
            return None;
        }
        let region = self.document.create_element("div");
        if let Err(err) = self.build_region(region, message, politeness) {
            tracing::warn!(target: "veil::a11y", %err, "failed to inject live region");
            let _ = self.document.remove(region);
            return None;
        }
        self.regions.schedule(self.config.linger, region);
        tracing::debug!(
            target: "veil::a11y",
            region = %region,
            politeness = politeness.as_str(),
            text = message,
            "announced"
        );
        Some(region)
    }

    /// Advance time, removing regions whose linger elapsed.
    ///
    /// Returns the number of regions removed.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        self.regions
            .advance(elapsed)
            .into_iter()
            .filter(|&region| self.retire(region))
            .count()
    }

    /// Remove every pending region immediately.
    pub fn flush(&mut self) -> usize {
        self.regions
            .drain()
            .into_iter()
            .filter(|&region| self.retire(region))
            .count()
    }

    /// Regions currently owned (not yet retired).
    pub fn live_regions(&self) -> usize {
        self.regions.len()
    }

    fn build_region(
        &self,
        region: ElementId,
        message: &str,
        politeness: Politeness,
    ) -> Result<(), DomError> {
        let doc = &self.document;
        doc.set_attribute(region, "role", "status")?;
        doc.set_attribute(region, "aria-live", politeness.as_str())?;
        doc.set_attribute(region, "aria-atomic", "true")?;
        doc.set_attribute(region, "class", "visually-hidden")?;
        doc.set_text(region, message)?;
        doc.append_child(doc.body(), region)
    }

    fn retire(&self, region: ElementId) -> bool {
        self.document.remove(region).is_ok()
    }
}

impl Drop for ScreenReaderAnnouncer {
    fn drop(&mut self) {
        self.flush();
    }
}
