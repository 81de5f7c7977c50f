#![forbid(unsafe_code)]

//! Modal lifecycle controller.
//!
//! [`ModalController`] owns the `open` state of one modal surface and
//! sequences everything that hangs off it: the document-level Escape
//! listener, the scroll lock, the focus trap, lifecycle notifications and
//! the closing announcement.
//!
//! ```text
//!            show()                 animation window
//!  Closed ───────────▶ Opening ───────────────────────▶ Open
//!    ▲                  │   ▲                            │
//!    │    close(src)    │   │ show()                     │ close(src)
//!    │  ┌───────────────┘   │                            │ (not vetoed)
//!    │  ▼                   │                            ▼
//!    └─────────────────── Closing ◀──────────────────────┘
//!      animation window
//! ```
//!
//! # Ordering
//!
//! - `show` and `close-requested` fire synchronously, before any resource
//!   is acquired or released.
//! - The focus trap is activated after the render commit: a zero-delay
//!   timer drained by the next [`ModalController::tick`].
//! - `after-show` fires after the animation window, once the trap is
//!   active. `after-close` fires after the window, once the scroll lock
//!   and Escape listener are released.
//!
//! # Invariants
//!
//! - While `Closed`, no focus trap, scroll lock token, Escape listener or
//!   lifecycle timer is held.
//! - At most one timer per [`TimerTag`]. A close cuts short a running
//!   entrance by replacing its animation timer, never by adding a second.
//! - `close-requested` is the only cancellation point. Past it, a
//!   transition runs to completion unless reversed by `show()`.
//!
//! # Failure Modes
//!
//! - `show()` / `close()` in a phase that does not accept them are
//!   ignored.
//! - Every operation on an unmounted controller is a no-op.
//! - A panel that cannot be trapped (detached by the rendering layer) is
//!   logged and the modal stays usable without a trap.
//!
//! # Re-entrancy
//!
//! Listeners only see the [`ModalEvent`](crate::modal::ModalEvent). Use a
//! [`ModalRemote`] captured before subscribing to call back into the
//! controller; its commands run once the current operation has finished.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use veil_a11y::{AnnouncerConfig, ScreenReaderAnnouncer};
use veil_core::{ClickEvent, Document, ElementId, Event, KeyEvent, KeyListenerId};
use veil_runtime::{FrameClock, Scheduler};
use web_time::Duration;

use crate::modal::container::{ModalConfig, ModalParts};
use crate::modal::dismiss::{DismissSource, resolve_click, resolve_key};
use crate::modal::event_gate::{EventGate, ListenerId, ModalEvent, ModalEventKind};
use crate::modal::focus_trap::FocusTrap;
use crate::modal::scroll_lock::{ScrollLock, ScrollLockService, ScrollLockToken};
use crate::modal::state::ModalState;

/// Label of the document-level Escape listener.
pub const ESCAPE_LISTENER_LABEL: &str = "veil-modal-escape";

/// Upper bound on remote commands applied after a single operation.
const MAX_QUEUED_COMMANDS: usize = 64;

/// Timers owned by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerTag {
    /// Post-render focus trap activation.
    FocusCommit,
    /// End of the entrance or exit animation window.
    Animation,
    /// Auto-dismiss.
    AutoClose,
}

/// A deferred controller call issued through a [`ModalRemote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalCommand {
    Show,
    Close(DismissSource),
}

type CommandQueue = Rc<RefCell<VecDeque<ModalCommand>>>;

/// Weak, cloneable handle for driving a controller from its own listeners.
///
/// Calls are queued and applied after the operation that is currently
/// dispatching has returned. Once the controller is dropped every call is
/// a no-op.
#[derive(Debug, Clone)]
pub struct ModalRemote {
    queue: Weak<RefCell<VecDeque<ModalCommand>>>,
}

impl ModalRemote {
    /// Queue a `show()`. Returns `false` if the controller is gone.
    pub fn show(&self) -> bool {
        self.push(ModalCommand::Show)
    }

    /// Queue a `close()` with source [`DismissSource::Method`].
    pub fn close(&self) -> bool {
        self.push(ModalCommand::Close(DismissSource::Method))
    }

    /// Queue a close with an explicit source.
    pub fn close_with(&self, source: DismissSource) -> bool {
        self.push(ModalCommand::Close(source))
    }

    /// Queue the `open` property write.
    pub fn set_open(&self, open: bool) -> bool {
        if open { self.show() } else { self.close() }
    }

    /// Whether the controller still exists.
    pub fn is_attached(&self) -> bool {
        self.queue.strong_count() > 0
    }

    fn push(&self, command: ModalCommand) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            return false;
        };
        queue.borrow_mut().push_back(command);
        true
    }
}

/// Lifecycle controller for one modal surface.
pub struct ModalController<S: ScrollLockService = ScrollLock> {
    document: Document,
    parts: ModalParts,
    config: ModalConfig,
    state: ModalState,
    mounted: bool,
    gate: EventGate,
    trap: FocusTrap,
    scroll: S,
    token: Option<ScrollLockToken>,
    return_focus: Option<ElementId>,
    escape_listener: Option<KeyListenerId>,
    timers: Scheduler<TimerTag>,
    announcer: ScreenReaderAnnouncer,
    commands: CommandQueue,
}

impl<S: ScrollLockService> std::fmt::Debug for ModalController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalController")
            .field("parts", &self.parts)
            .field("state", &self.state)
            .field("mounted", &self.mounted)
            .field("trap_active", &self.trap.is_active())
            .field("holds_scroll_lock", &self.token.is_some())
            .field("timers", &self.timers.len())
            .finish()
    }
}

impl ModalController<ScrollLock> {
    /// Controller locking scroll on `document`. Holds are counted per
    /// document, so separately created controllers never unlock each other.
    pub fn new(document: Document, parts: ModalParts, config: ModalConfig) -> Self {
        let scroll = ScrollLock::new(document.clone());
        Self::with_scroll_lock(document, parts, config, scroll)
    }
}

impl<S: ScrollLockService> ModalController<S> {
    /// Controller using an injected scroll lock service.
    pub fn with_scroll_lock(
        document: Document,
        parts: ModalParts,
        config: ModalConfig,
        scroll: S,
    ) -> Self {
        let announcer = ScreenReaderAnnouncer::with_config(
            document.clone(),
            AnnouncerConfig::default().politeness(config.politeness),
        );
        Self {
            trap: FocusTrap::new(document.clone()),
            document,
            parts,
            config,
            state: ModalState::Closed,
            mounted: true,
            gate: EventGate::new(),
            scroll,
            token: None,
            return_focus: None,
            escape_listener: None,
            timers: Scheduler::new(),
            announcer,
            commands: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    // --- Queries ---

    #[inline]
    pub fn state(&self) -> ModalState {
        self.state
    }

    /// The `open` property: true while Opening or Open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.is_open_intent()
    }

    pub fn parts(&self) -> &ModalParts {
        &self.parts
    }

    pub fn config(&self) -> &ModalConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn focus_trap_active(&self) -> bool {
        self.trap.is_active()
    }

    pub fn holds_scroll_lock(&self) -> bool {
        self.token.is_some()
    }

    pub fn has_escape_listener(&self) -> bool {
        self.escape_listener.is_some()
    }

    /// Element focus returns to when the modal closes.
    pub fn return_focus(&self) -> Option<ElementId> {
        self.return_focus
    }

    /// Redirect where focus returns on close. Elements inside the panel are
    /// ignored.
    pub fn set_return_focus(&mut self, target: Option<ElementId>) {
        self.return_focus = target.filter(|&el| !self.document.contains(self.parts.panel, el));
        self.trap.set_restore_to(self.return_focus);
    }

    pub fn scroll_lock(&self) -> &S {
        &self.scroll
    }

    pub fn announcer(&self) -> &ScreenReaderAnnouncer {
        &self.announcer
    }

    /// Whether a timer with this tag is pending.
    pub fn is_pending(&self, tag: TimerTag) -> bool {
        self.timers.is_pending(&tag)
    }

    /// In-flight timers, lifecycle and announcement alike.
    pub fn pending_timers(&self) -> usize {
        self.timers.len() + self.announcer.live_regions()
    }

    /// Time until the next lifecycle timer fires.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Handle for calling back into this controller from listeners.
    pub fn remote(&self) -> ModalRemote {
        ModalRemote {
            queue: Rc::downgrade(&self.commands),
        }
    }

    // --- Listeners ---

    pub fn subscribe(&mut self, listener: impl FnMut(&mut ModalEvent) + 'static) -> ListenerId {
        self.gate.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.gate.unsubscribe(id)
    }

    // --- Lifecycle ---

    /// Begin showing the modal. Ignored while Opening or Open.
    pub fn show(&mut self) {
        self.begin_show();
        self.drain_commands();
    }

    /// Request a programmatic close.
    pub fn close(&mut self) {
        self.close_with(DismissSource::Method);
    }

    /// Request a close attributed to `source`. Ignored while Closing or
    /// Closed; aborted if a listener vetoes `close-requested`.
    pub fn close_with(&mut self, source: DismissSource) {
        self.begin_close(source);
        self.drain_commands();
    }

    /// Write the `open` property.
    pub fn set_open(&mut self, open: bool) {
        if open {
            self.show();
        } else {
            self.close();
        }
    }

    /// Dismiss automatically after `delay` unless closed sooner.
    ///
    /// Replaces a pending auto-close. Returns whether the timer was armed.
    pub fn schedule_auto_close(&mut self, delay: Duration) -> bool {
        if !self.mounted || !self.state.accepts_close() {
            return false;
        }
        self.timers.schedule(delay, TimerTag::AutoClose);
        true
    }

    /// Disarm the auto-close timer. Returns whether one was pending.
    pub fn cancel_auto_close(&mut self) -> bool {
        self.timers.cancel(&TimerTag::AutoClose)
    }

    /// Route an input event. Returns whether it was consumed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        if !self.mounted || !self.state.is_visible() {
            return false;
        }
        let consumed = match event {
            Event::Key(key) => self.handle_key(key),
            Event::Click(click) => self.handle_click(click),
        };
        self.drain_commands();
        consumed
    }

    /// Advance time by `elapsed`, firing due timers in deadline order.
    pub fn tick(&mut self, elapsed: Duration) {
        if !self.mounted {
            return;
        }
        let start = self.timers.now();
        let until = start.saturating_add(elapsed);
        let mut synced = start;
        while let Some(tag) = self.timers.pop_due(until) {
            let at = self.timers.now();
            self.announcer.tick(at.saturating_sub(synced));
            synced = at;
            self.fire(tag);
            self.drain_commands();
        }
        self.timers.settle(until);
        self.announcer.tick(until.saturating_sub(synced));
    }

    /// [`ModalController::tick`] with the time measured by `clock`.
    pub fn tick_with(&mut self, clock: &mut FrameClock) {
        let elapsed = clock.tick();
        self.tick(elapsed);
    }

    /// Tear down immediately: release everything, cancel all timers and
    /// jump to `Closed` without events. Also runs on drop.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        let cancelled = self.timers.cancel_all();
        self.trap.deactivate();
        if let Some(token) = self.token.take() {
            self.scroll.release(token);
        }
        if let Some(id) = self.escape_listener.take() {
            self.document.remove_key_listener(id);
        }
        let regions = self.announcer.flush();
        self.commands.borrow_mut().clear();
        if self.state != ModalState::Closed {
            self.transition(ModalState::Closed);
        }
        tracing::debug!(
            target: "veil::modal",
            timers = cancelled,
            regions,
            "modal unmounted"
        );
    }

    // --- Internals ---

    fn transition(&mut self, to: ModalState) {
        let from = std::mem::replace(&mut self.state, to);
        tracing::debug!(
            target: "veil::modal",
            from = %from,
            to = %to,
            panel = %self.parts.panel,
            "modal state transition"
        );
    }

    fn begin_show(&mut self) {
        if !self.mounted || !self.state.accepts_show() {
            tracing::trace!(target: "veil::modal", state = %self.state, "show ignored");
            return;
        }
        let opener = self.focused_outside_panel();
        if opener.is_some() || self.state == ModalState::Closed {
            self.return_focus = opener;
        }
        self.transition(ModalState::Opening);
        self.gate.dispatch_informational(ModalEventKind::Show);

        if self.escape_listener.is_none() {
            self.escape_listener = Some(self.document.add_key_listener(ESCAPE_LISTENER_LABEL));
        }
        if self.token.is_none() {
            self.token = Some(self.scroll.acquire());
        }
        self.timers.schedule(Duration::ZERO, TimerTag::FocusCommit);
        self.timers
            .schedule(self.config.animation_duration, TimerTag::Animation);
    }

    fn begin_close(&mut self, source: DismissSource) {
        if !self.mounted || !self.state.accepts_close() {
            tracing::trace!(target: "veil::modal", state = %self.state, "close ignored");
            return;
        }
        let outcome = self
            .gate
            .dispatch_cancelable(ModalEventKind::CloseRequested, Some(source));
        if outcome.is_vetoed() {
            tracing::debug!(target: "veil::modal", source = source.as_str(), "close vetoed");
            return;
        }

        self.trap.deactivate();
        self.timers.cancel(&TimerTag::FocusCommit);
        self.timers.cancel(&TimerTag::AutoClose);
        self.transition(ModalState::Closing);
        self.timers
            .schedule(self.config.animation_duration, TimerTag::Animation);
    }

    fn fire(&mut self, tag: TimerTag) {
        match tag {
            TimerTag::FocusCommit => self.commit_focus(),
            TimerTag::Animation => match self.state {
                ModalState::Opening => self.finish_show(),
                ModalState::Closing => self.finish_close(),
                ModalState::Open | ModalState::Closed => {}
            },
            TimerTag::AutoClose => self.begin_close(DismissSource::Method),
        }
    }

    fn commit_focus(&mut self) {
        if !self.state.is_open_intent() || self.trap.is_active() {
            return;
        }
        if let Some(focused) = self.focused_outside_panel() {
            self.return_focus = Some(focused);
        }
        if let Err(err) = self
            .trap
            .activate_returning_to(self.parts.panel, self.return_focus)
        {
            tracing::warn!(target: "veil::modal", %err, "focus trap not activated");
        }
    }

    fn focused_outside_panel(&self) -> Option<ElementId> {
        self.document
            .active_element()
            .filter(|&el| !self.document.contains(self.parts.panel, el))
    }

    fn finish_show(&mut self) {
        // The commit timer is always due first; this only covers a panel
        // that was attached late.
        self.commit_focus();
        self.transition(ModalState::Open);
        self.gate.dispatch_informational(ModalEventKind::AfterShow);
        if self.config.announce {
            let message = self.config.opened_message();
            self.announcer.announce_with(&message, self.config.politeness);
        }
    }

    fn finish_close(&mut self) {
        if let Some(token) = self.token.take() {
            self.scroll.release(token);
        }
        if let Some(id) = self.escape_listener.take() {
            self.document.remove_key_listener(id);
        }
        self.transition(ModalState::Closed);
        self.gate.dispatch_informational(ModalEventKind::AfterClose);
        if self.config.announce {
            let message = self.config.closed_message();
            self.announcer.announce_with(&message, self.config.politeness);
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if key.is_escape() {
            let listening = self
                .escape_listener
                .is_some_and(|id| self.document.has_key_listener(id));
            if !listening || !self.state.accepts_close() {
                return false;
            }
            return match resolve_key(&self.config, key) {
                Some(source) => {
                    self.begin_close(source);
                    true
                }
                None => false,
            };
        }
        self.trap.handle_key(key)
    }

    fn handle_click(&mut self, click: &ClickEvent) -> bool {
        if !self.state.accepts_close() {
            return false;
        }
        match resolve_click(&self.document, &self.parts, &self.config, click) {
            Some(source) => {
                self.begin_close(source);
                true
            }
            None => false,
        }
    }

    fn drain_commands(&mut self) {
        for _ in 0..MAX_QUEUED_COMMANDS {
            let next = self.commands.borrow_mut().pop_front();
            match next {
                Some(ModalCommand::Show) => self.begin_show(),
                Some(ModalCommand::Close(source)) => self.begin_close(source),
                None => return,
            }
        }
        let dropped = {
            let mut queue = self.commands.borrow_mut();
            let dropped = queue.len();
            queue.clear();
            dropped
        };
        if dropped > 0 {
            tracing::warn!(target: "veil::modal", dropped, "remote command queue overflow");
        }
    }
}

impl<S: ScrollLockService> Drop for ModalController<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use veil_core::{ElementId, KeyCode, Modifiers};

    const WINDOW: Duration = Duration::from_millis(250);

    struct Surface {
        doc: Document,
        trigger: ElementId,
        parts: ModalParts,
        input: ElementId,
        confirm: ElementId,
    }

    fn surface() -> Surface {
        let doc = Document::new();
        let trigger = doc.append_new(doc.body(), "button").unwrap();
        let host = doc.append_new(doc.body(), "div").unwrap();
        let backdrop = doc.append_new(host, "div").unwrap();
        let panel = doc.append_new(host, "div").unwrap();
        let close = doc.append_new(panel, "button").unwrap();
        let input = doc.append_new(panel, "input").unwrap();
        let confirm = doc.append_new(panel, "button").unwrap();
        doc.focus(trigger).unwrap();
        doc.scroll_to(300);
        Surface {
            doc,
            trigger,
            parts: ModalParts::new(panel, backdrop).with_close_button(close),
            input,
            confirm,
        }
    }

    fn recorder(modal: &mut ModalController) -> Rc<RefCell<Vec<(ModalEventKind, Option<DismissSource>)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        modal.subscribe(move |event| sink.borrow_mut().push((event.kind(), event.source())));
        log
    }

    fn opened(s: &Surface) -> ModalController {
        let mut modal = ModalController::new(s.doc.clone(), s.parts, ModalConfig::default());
        modal.show();
        modal.tick(WINDOW);
        modal
    }

    #[test]
    fn show_runs_full_entrance() {
        let s = surface();
        let mut modal = ModalController::new(s.doc.clone(), s.parts, ModalConfig::default());
        let log = recorder(&mut modal);

        modal.show();
        assert_eq!(modal.state(), ModalState::Opening);
        assert!(modal.is_open());
        assert!(modal.holds_scroll_lock());
        assert!(modal.has_escape_listener());
        assert!(s.doc.is_scroll_pinned());
        assert!(!modal.focus_trap_active());
        assert_eq!(*log.borrow(), vec![(ModalEventKind::Show, None)]);

        modal.tick(Duration::ZERO);
        assert!(modal.focus_trap_active());
        assert_eq!(s.doc.active_element(), modal.parts().close_button);

        modal.tick(WINDOW - Duration::from_millis(1));
        assert_eq!(modal.state(), ModalState::Opening);
        modal.tick(Duration::from_millis(1));
        assert_eq!(modal.state(), ModalState::Open);
        assert_eq!(
            *log.borrow(),
            vec![(ModalEventKind::Show, None), (ModalEventKind::AfterShow, None)]
        );
        assert_eq!(s.doc.query_attribute("role", "status").len(), 1);
    }

    #[test]
    fn show_when_open_is_idempotent() {
        let s = surface();
        let mut modal = opened(&s);
        let log = recorder(&mut modal);
        modal.show();
        modal.set_open(true);
        modal.tick(WINDOW);
        assert_eq!(modal.state(), ModalState::Open);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn close_runs_full_exit() {
        let s = surface();
        let mut modal = opened(&s);
        let log = recorder(&mut modal);

        modal.close();
        assert_eq!(modal.state(), ModalState::Closing);
        assert!(!modal.focus_trap_active());
        assert_eq!(s.doc.active_element(), Some(s.trigger));
        assert!(modal.holds_scroll_lock());

        modal.tick(WINDOW);
        assert_eq!(modal.state(), ModalState::Closed);
        assert!(!modal.holds_scroll_lock());
        assert!(!modal.has_escape_listener());
        assert!(!s.doc.is_scroll_pinned());
        assert_eq!(s.doc.scroll_y(), 300);
        assert_eq!(
            *log.borrow(),
            vec![
                (ModalEventKind::CloseRequested, Some(DismissSource::Method)),
                (ModalEventKind::AfterClose, None),
            ]
        );
    }

    #[test]
    fn veto_keeps_everything_held() {
        let s = surface();
        let mut modal = opened(&s);
        modal.subscribe(|event| event.prevent_default());
        modal.close_with(DismissSource::CloseButton);
        modal.tick(WINDOW);
        assert_eq!(modal.state(), ModalState::Open);
        assert!(modal.focus_trap_active());
        assert!(modal.holds_scroll_lock());
    }

    #[test]
    fn close_during_opening_replaces_animation_timer() {
        let s = surface();
        let mut modal = ModalController::new(s.doc.clone(), s.parts, ModalConfig::default());
        let log = recorder(&mut modal);
        modal.show();
        modal.tick(Duration::from_millis(100));
        modal.close();
        assert_eq!(modal.state(), ModalState::Closing);
        assert!(modal.is_pending(TimerTag::Animation));
        assert!(!modal.is_pending(TimerTag::FocusCommit));

        modal.tick(Duration::from_millis(200));
        assert_eq!(modal.state(), ModalState::Closing);
        modal.tick(Duration::from_millis(50));
        assert_eq!(modal.state(), ModalState::Closed);
        let kinds: Vec<_> = log.borrow().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                ModalEventKind::Show,
                ModalEventKind::CloseRequested,
                ModalEventKind::AfterClose
            ]
        );
    }

    #[test]
    fn show_during_closing_reverses() {
        let s = surface();
        let mut modal = opened(&s);
        modal.close();
        modal.tick(Duration::from_millis(100));
        modal.show();
        assert_eq!(modal.state(), ModalState::Opening);
        assert!(modal.holds_scroll_lock());
        assert_eq!(s.doc.key_listener_count(), 1);

        modal.tick(WINDOW);
        assert_eq!(modal.state(), ModalState::Open);
        assert!(modal.focus_trap_active());
        assert_eq!(modal.scroll_lock().holders(), 1);
    }

    #[test]
    fn escape_closes_with_keyboard_source() {
        let s = surface();
        let mut modal = opened(&s);
        let log = recorder(&mut modal);
        assert!(modal.handle_event(&KeyEvent::new(KeyCode::Escape).into()));
        assert_eq!(modal.state(), ModalState::Closing);
        assert_eq!(
            log.borrow()[0],
            (ModalEventKind::CloseRequested, Some(DismissSource::Keyboard))
        );
    }

    #[test]
    fn escape_ignored_when_backdrop_close_disabled() {
        let s = surface();
        let config = ModalConfig::default().no_close_on_backdrop(true);
        let mut modal = ModalController::new(s.doc.clone(), s.parts, config);
        modal.show();
        modal.tick(WINDOW);
        assert!(!modal.handle_event(&KeyEvent::new(KeyCode::Escape).into()));
        assert!(!modal.handle_event(&ClickEvent::new(s.parts.backdrop).into()));
        assert_eq!(modal.state(), ModalState::Open);

        let close = s.parts.close_button.unwrap();
        assert!(modal.handle_event(&ClickEvent::new(close).into()));
        assert_eq!(modal.state(), ModalState::Closing);
    }

    #[test]
    fn escape_needs_registered_listener() {
        let s = surface();
        let mut modal = opened(&s);
        let labels = s.doc.key_listener_labels();
        assert_eq!(labels, vec![ESCAPE_LISTENER_LABEL]);
        assert!(modal.handle_event(&KeyEvent::new(KeyCode::Escape).into()));
        modal.tick(WINDOW);
        assert!(!modal.handle_event(&KeyEvent::new(KeyCode::Escape).into()));
        assert_eq!(s.doc.key_listener_count(), 0);
    }

    #[test]
    fn tab_cycles_inside_panel() {
        let s = surface();
        let mut modal = opened(&s);
        s.doc.focus(s.confirm).unwrap();
        assert!(modal.handle_event(&KeyEvent::new(KeyCode::Tab).into()));
        assert_eq!(s.doc.active_element(), modal.parts().close_button);
        let back = KeyEvent::new(KeyCode::Tab).with_modifiers(Modifiers::SHIFT);
        assert!(modal.handle_event(&back.into()));
        assert_eq!(s.doc.active_element(), Some(s.confirm));
        assert!(modal.handle_event(&back.into()));
        assert_eq!(s.doc.active_element(), Some(s.input));
    }

    #[test]
    fn events_ignored_while_closed() {
        let s = surface();
        let mut modal = ModalController::new(s.doc.clone(), s.parts, ModalConfig::default());
        assert!(!modal.handle_event(&KeyEvent::new(KeyCode::Tab).into()));
        assert!(!modal.handle_event(&ClickEvent::new(s.parts.backdrop).into()));
    }

    #[test]
    fn auto_close_fires_method_close() {
        let s = surface();
        let mut modal = opened(&s);
        let log = recorder(&mut modal);
        assert!(modal.schedule_auto_close(Duration::from_secs(3)));
        modal.tick(Duration::from_secs(3));
        assert_eq!(modal.state(), ModalState::Closing);
        assert_eq!(
            log.borrow()[0],
            (ModalEventKind::CloseRequested, Some(DismissSource::Method))
        );
    }

    #[test]
    fn manual_close_clears_auto_close() {
        let s = surface();
        let mut modal = opened(&s);
        modal.schedule_auto_close(Duration::from_secs(3));
        modal.handle_event(&ClickEvent::new(s.parts.backdrop).into());
        assert!(!modal.is_pending(TimerTag::AutoClose));
        assert!(!modal.schedule_auto_close(Duration::from_secs(1)));
        assert!(!modal.cancel_auto_close());
    }

    #[test]
    fn remote_close_from_listener_runs_after_dispatch() {
        let s = surface();
        let mut modal = ModalController::new(s.doc.clone(), s.parts, ModalConfig::default());
        let remote = modal.remote();
        modal.subscribe(move |event| {
            if event.kind() == ModalEventKind::AfterShow {
                remote.close();
            }
        });
        modal.show();
        modal.tick(WINDOW);
        assert_eq!(modal.state(), ModalState::Closing);
        assert_eq!(modal.timers.len(), 1);
    }

    #[test]
    fn remote_detaches_when_controller_drops() {
        let s = surface();
        let remote = {
            let modal = opened(&s);
            modal.remote()
        };
        assert!(!remote.is_attached());
        assert!(!remote.show());
        assert!(!s.doc.is_scroll_pinned());
    }

    #[test]
    fn unmount_releases_everything() {
        let s = surface();
        let mut modal = opened(&s);
        modal.schedule_auto_close(Duration::from_secs(5));
        modal.unmount();
        assert_eq!(modal.state(), ModalState::Closed);
        assert_eq!(modal.pending_timers(), 0);
        assert!(!modal.holds_scroll_lock());
        assert!(!modal.focus_trap_active());
        assert_eq!(s.doc.key_listener_count(), 0);
        assert!(s.doc.query_attribute("role", "status").is_empty());

        modal.show();
        modal.close();
        modal.tick(WINDOW);
        assert_eq!(modal.state(), ModalState::Closed);
        assert!(!modal.is_mounted());
    }

    #[test]
    fn announcements_respect_config() {
        let s = surface();
        let config = ModalConfig::default().label("Settings").announce(true);
        let mut modal = ModalController::new(s.doc.clone(), s.parts, config);
        modal.show();
        modal.tick(WINDOW);
        let regions = s.doc.query_attribute("role", "status");
        assert_eq!(regions.len(), 1);
        assert_eq!(
            s.doc.text(regions[0]).as_deref(),
            Some("Settings dialog opened")
        );
        modal.tick(Duration::from_secs(1));
        assert!(s.doc.query_attribute("role", "status").is_empty());

        let mut quiet = ModalController::new(
            s.doc.clone(),
            s.parts,
            ModalConfig::default().announce(false),
        );
        quiet.show();
        quiet.tick(WINDOW);
        assert_eq!(quiet.announcer().live_regions(), 0);
    }

    #[test]
    fn separate_controllers_share_the_document_lock() {
        let s = surface();
        let backdrop = s.doc.append_new(s.doc.body(), "div").unwrap();
        let panel = s.doc.append_new(s.doc.body(), "div").unwrap();
        s.doc.append_new(panel, "button").unwrap();

        let mut first = opened(&s);
        let mut second = ModalController::new(
            s.doc.clone(),
            ModalParts::new(panel, backdrop),
            ModalConfig::default(),
        );
        second.show();
        second.tick(WINDOW);
        assert_eq!(first.scroll_lock().holders(), 2);

        second.close();
        second.tick(WINDOW);
        assert_eq!(first.state(), ModalState::Open);
        assert!(first.holds_scroll_lock());
        assert!(s.doc.is_scroll_pinned());

        first.close();
        first.tick(WINDOW);
        assert!(!s.doc.is_scroll_pinned());
        assert_eq!(s.doc.scroll_y(), 300);
    }

    #[test]
    fn autofocused_panel_still_returns_to_opener() {
        let s = surface();
        let mut modal = ModalController::new(s.doc.clone(), s.parts, ModalConfig::default());
        modal.show();
        assert_eq!(modal.return_focus(), Some(s.trigger));
        // The rendering layer focuses an element before the commit runs.
        s.doc.focus(s.input).unwrap();
        modal.tick(WINDOW);
        assert_eq!(s.doc.active_element(), Some(s.input));

        modal.close();
        assert_eq!(s.doc.active_element(), Some(s.trigger));
    }

    #[test]
    fn return_focus_can_be_redirected() {
        let s = surface();
        let elsewhere = s.doc.append_new(s.doc.body(), "button").unwrap();
        let mut modal = opened(&s);
        modal.set_return_focus(Some(s.confirm));
        assert_eq!(modal.return_focus(), None);
        modal.set_return_focus(Some(elsewhere));
        assert_eq!(modal.return_focus(), Some(elsewhere));

        modal.close();
        assert_eq!(s.doc.active_element(), Some(elsewhere));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Show,
            Close,
            Escape,
            Backdrop,
            Tick(u64),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Show),
                Just(Op::Close),
                Just(Op::Escape),
                Just(Op::Backdrop),
                (0u64..400).prop_map(Op::Tick),
            ]
        }

        proptest! {
            #[test]
            fn resources_follow_state(ops in proptest::collection::vec(op(), 0..40)) {
                let s = surface();
                let mut modal = ModalController::new(s.doc.clone(), s.parts, ModalConfig::default());
                for op in ops {
                    match op {
                        Op::Show => modal.show(),
                        Op::Close => modal.close(),
                        Op::Escape => {
                            modal.handle_event(&KeyEvent::new(KeyCode::Escape).into());
                        }
                        Op::Backdrop => {
                            modal.handle_event(&ClickEvent::new(s.parts.backdrop).into());
                        }
                        Op::Tick(ms) => modal.tick(Duration::from_millis(ms)),
                    }
                    prop_assert!(modal.scroll_lock().holders() <= 1);
                    prop_assert!(s.doc.key_listener_count() <= 1);
                    prop_assert!(modal.is_pending(TimerTag::Animation) == modal.state().is_transitioning());
                    if modal.state() == ModalState::Closed {
                        prop_assert!(!modal.holds_scroll_lock());
                        prop_assert!(!modal.focus_trap_active());
                        prop_assert!(!modal.has_escape_listener());
                        prop_assert!(!s.doc.is_scroll_pinned());
                    } else {
                        prop_assert!(modal.holds_scroll_lock());
                        prop_assert!(modal.has_escape_listener());
                    }
                    if modal.state() == ModalState::Closing {
                        prop_assert!(!modal.focus_trap_active());
                    }
                }
            }
        }
    }
}
