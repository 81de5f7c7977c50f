#![forbid(unsafe_code)]

//! Cancelable lifecycle notifications.
//!
//! The [`EventGate`] delivers [`ModalEvent`]s to listeners in registration
//! order. A cancelable event reports its result as an explicit
//! [`Outcome`]; an informational event ignores `prevent_default()`.
//!
//! Listeners receive only the event. To act on the modal from inside a
//! listener, capture a [`ModalRemote`](crate::modal::ModalRemote): its
//! commands are applied once the current dispatch has returned.

use std::fmt;

use crate::modal::dismiss::DismissSource;

/// Lifecycle notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalEventKind {
    /// Show accepted; entrance starting.
    Show,
    /// Entrance finished.
    AfterShow,
    /// Close attempt; cancelable, carries the dismiss source.
    CloseRequested,
    /// Exit finished and resources released.
    AfterClose,
}

impl ModalEventKind {
    /// Event name as observed by consumers.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::AfterShow => "after-show",
            Self::CloseRequested => "close-requested",
            Self::AfterClose => "after-close",
        }
    }
}

impl fmt::Display for ModalEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lifecycle notification as seen by a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalEvent {
    kind: ModalEventKind,
    source: Option<DismissSource>,
    cancelable: bool,
    default_prevented: bool,
}

impl ModalEvent {
    fn new(kind: ModalEventKind, source: Option<DismissSource>, cancelable: bool) -> Self {
        Self {
            kind,
            source,
            cancelable,
            default_prevented: false,
        }
    }

    pub fn kind(&self) -> ModalEventKind {
        self.kind
    }

    /// Dismiss source, present on `close-requested`.
    pub fn source(&self) -> Option<DismissSource> {
        self.source
    }

    /// Lifecycle events always bubble.
    pub fn bubbles(&self) -> bool {
        true
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Veto the transition. No effect on informational events.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Result of a cancelable dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No listener objected; proceed.
    Accepted,
    /// A listener called `prevent_default()`.
    Vetoed,
}

impl Outcome {
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }

    #[inline]
    pub fn is_vetoed(self) -> bool {
        matches!(self, Self::Vetoed)
    }
}

/// Handle returned by [`EventGate::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&mut ModalEvent)>;

/// Ordered set of lifecycle listeners.
#[derive(Default)]
pub struct EventGate {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for EventGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventGate")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners run in registration order.
    pub fn subscribe(&mut self, listener: impl FnMut(&mut ModalEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Dispatch a cancelable notification.
    pub fn dispatch_cancelable(
        &mut self,
        kind: ModalEventKind,
        source: Option<DismissSource>,
    ) -> Outcome {
        let event = self.dispatch(ModalEvent::new(kind, source, true));
        if event.default_prevented() {
            Outcome::Vetoed
        } else {
            Outcome::Accepted
        }
    }

    /// Dispatch an informational notification.
    pub fn dispatch_informational(&mut self, kind: ModalEventKind) {
        self.dispatch(ModalEvent::new(kind, None, false));
    }

    fn dispatch(&mut self, mut event: ModalEvent) -> ModalEvent {
        tracing::trace!(
            target: "veil::modal",
            event = event.kind.name(),
            source = event.source.map(DismissSource::as_str),
            listeners = self.listeners.len(),
            "dispatch"
        );
        for (_, listener) in &mut self.listeners {
            listener(&mut event);
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn accepted_without_listeners() {
        let mut gate = EventGate::new();
        assert_eq!(
            gate.dispatch_cancelable(ModalEventKind::CloseRequested, Some(DismissSource::Method)),
            Outcome::Accepted
        );
    }

    #[test]
    fn veto_is_reported() {
        let mut gate = EventGate::new();
        gate.subscribe(|event| {
            if event.source() == Some(DismissSource::Overlay) {
                event.prevent_default();
            }
        });
        assert!(
            gate.dispatch_cancelable(ModalEventKind::CloseRequested, Some(DismissSource::Overlay))
                .is_vetoed()
        );
        assert!(
            gate.dispatch_cancelable(ModalEventKind::CloseRequested, Some(DismissSource::Method))
                .is_accepted()
        );
    }

    #[test]
    fn informational_events_cannot_be_prevented() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let mut gate = EventGate::new();
        gate.subscribe(move |event| {
            event.prevent_default();
            log.borrow_mut()
                .push((event.kind(), event.is_cancelable(), event.default_prevented()));
        });
        gate.dispatch_informational(ModalEventKind::AfterShow);
        assert_eq!(
            *seen.borrow(),
            vec![(ModalEventKind::AfterShow, false, false)]
        );
    }

    #[test]
    fn listeners_run_in_order_and_all_see_veto() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut gate = EventGate::new();
        let first = Rc::clone(&seen);
        gate.subscribe(move |event| {
            event.prevent_default();
            first.borrow_mut().push(("first", event.default_prevented()));
        });
        let second = Rc::clone(&seen);
        gate.subscribe(move |event| {
            second.borrow_mut().push(("second", event.default_prevented()));
        });
        gate.dispatch_cancelable(ModalEventKind::CloseRequested, None);
        assert_eq!(*seen.borrow(), vec![("first", true), ("second", true)]);
    }

    #[test]
    fn unsubscribe_removes_listener() {
        let mut gate = EventGate::new();
        let id = gate.subscribe(|event| event.prevent_default());
        assert_eq!(gate.listener_count(), 1);
        assert!(gate.unsubscribe(id));
        assert!(!gate.unsubscribe(id));
        assert!(
            gate.dispatch_cancelable(ModalEventKind::CloseRequested, None)
                .is_accepted()
        );
    }

    #[test]
    fn events_bubble_and_have_names() {
        let event = ModalEvent::new(ModalEventKind::CloseRequested, None, true);
        assert!(event.bubbles());
        assert_eq!(ModalEventKind::CloseRequested.name(), "close-requested");
        assert_eq!(ModalEventKind::AfterClose.to_string(), "after-close");
    }
}
