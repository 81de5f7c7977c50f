#![forbid(unsafe_code)]

//! Test harness and reference fixtures for Veil.
//!
//! - [`ModalFixture`]: a document with a trigger, an outside link and a
//!   rendered modal surface (backdrop, panel, close button, form controls).
//! - [`EventLog`]: records lifecycle notifications in dispatch order.
//! - [`ResourceSnapshot`]: everything a controller holds, in one comparable
//!   value.
//! - [`ModalOp`] / [`modal_op`]: proptest operations over a controller.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use veil_core::{ClickEvent, Document, ElementId, Event, KeyCode, KeyEvent, Modifiers};
use veil_runtime::Duration;
use veil_widgets::modal::{
    DEFAULT_ANIMATION_DURATION, DismissSource, ListenerId, ModalConfig, ModalController,
    ModalEvent, ModalEventKind, ModalParts, ModalState, ScrollLockService,
};

/// Scroll offset the fixture document starts at.
pub const FIXTURE_SCROLL_Y: i32 = 640;

/// One animation window at the default duration.
pub const WINDOW: Duration = DEFAULT_ANIMATION_DURATION;

/// Reference document:
///
/// ```text
/// body
/// ├── button            trigger (focused)
/// ├── a[href]           outside_link
/// └── div               host
///     ├── div           backdrop
///     └── div[role=dialog] panel
///         ├── button    close_button
///         │   └── span  close_glyph
///         ├── input     input
///         ├── button    cancel
///         └── button    confirm
/// ```
#[derive(Debug, Clone)]
pub struct ModalFixture {
    pub doc: Document,
    pub trigger: ElementId,
    pub outside_link: ElementId,
    pub host: ElementId,
    pub backdrop: ElementId,
    pub panel: ElementId,
    pub close_button: ElementId,
    pub close_glyph: ElementId,
    pub input: ElementId,
    pub cancel: ElementId,
    pub confirm: ElementId,
}

impl Default for ModalFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalFixture {
    pub fn new() -> Self {
        let doc = Document::new();
        let body = doc.body();
        let el = |parent, tag| {
            doc.append_new(parent, tag)
                .unwrap_or_else(|err| panic!("fixture: {err}"))
        };

        let trigger = el(body, "button");
        let outside_link = el(body, "a");
        let host = el(body, "div");
        let backdrop = el(host, "div");
        let panel = el(host, "div");
        let close_button = el(panel, "button");
        let close_glyph = el(close_button, "span");
        let input = el(panel, "input");
        let cancel = el(panel, "button");
        let confirm = el(panel, "button");

        let attrs = [
            (outside_link, "href", "#elsewhere"),
            (backdrop, "class", "modal-backdrop"),
            (panel, "role", "dialog"),
            (panel, "aria-modal", "true"),
            (close_button, "aria-label", "Close"),
            (input, "type", "text"),
        ];
        for (id, name, value) in attrs {
            doc.set_attribute(id, name, value)
                .unwrap_or_else(|err| panic!("fixture: {err}"));
        }

        doc.scroll_to(FIXTURE_SCROLL_Y);
        let focused = doc
            .focus(trigger)
            .unwrap_or_else(|err| panic!("fixture: {err}"));
        assert!(focused, "fixture: trigger must be focusable");

        Self {
            doc,
            trigger,
            outside_link,
            host,
            backdrop,
            panel,
            close_button,
            close_glyph,
            input,
            cancel,
            confirm,
        }
    }

    /// Parts as handed over by the rendering layer.
    pub fn parts(&self) -> ModalParts {
        ModalParts::new(self.panel, self.backdrop).with_close_button(self.close_button)
    }

    /// A fresh controller over this fixture.
    pub fn controller(&self, config: ModalConfig) -> ModalController {
        ModalController::new(self.doc.clone(), self.parts(), config)
    }

    /// A controller already driven to `Open`.
    pub fn opened(&self, config: ModalConfig) -> ModalController {
        let window = config.animation_duration;
        let mut modal = self.controller(config);
        modal.show();
        modal.tick(window);
        modal
    }

    /// Tabbable panel descendants in document order.
    pub fn panel_focusables(&self) -> Vec<ElementId> {
        vec![self.close_button, self.input, self.cancel, self.confirm]
    }

    /// Whether the focused element lies inside the panel.
    pub fn focus_in_panel(&self) -> bool {
        self.doc
            .active_element()
            .is_some_and(|el| self.doc.contains(self.panel, el))
    }
}

// --- Input ---

pub fn key(code: KeyCode) -> Event {
    KeyEvent::new(code).into()
}

pub fn tab() -> Event {
    key(KeyCode::Tab)
}

pub fn shift_tab() -> Event {
    KeyEvent::new(KeyCode::Tab)
        .with_modifiers(Modifiers::SHIFT)
        .into()
}

pub fn escape() -> Event {
    key(KeyCode::Escape)
}

pub fn click(target: ElementId) -> Event {
    ClickEvent::new(target).into()
}

// --- Event log ---

/// A recorded lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggedEvent {
    pub kind: ModalEventKind,
    pub source: Option<DismissSource>,
    pub default_prevented: bool,
}

/// Shared log of lifecycle notifications.
///
/// Attach before vetoing listeners to see events as dispatched; attach
/// after them to see the final `default_prevented` flag.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Rc<RefCell<Vec<LoggedEvent>>>,
}

impl EventLog {
    pub fn attach<S: ScrollLockService>(modal: &mut ModalController<S>) -> Self {
        let log = Self::default();
        let sink = Rc::clone(&log.entries);
        modal.subscribe(move |event| {
            sink.borrow_mut().push(LoggedEvent {
                kind: event.kind(),
                source: event.source(),
                default_prevented: event.default_prevented(),
            });
        });
        log
    }

    pub fn entries(&self) -> Vec<LoggedEvent> {
        self.entries.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<ModalEventKind> {
        self.entries.borrow().iter().map(|e| e.kind).collect()
    }

    /// Event names as observed by consumers.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.borrow().iter().map(|e| e.kind.name()).collect()
    }

    pub fn count(&self, kind: ModalEventKind) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    /// Sources of every `close-requested` seen.
    pub fn close_sources(&self) -> Vec<DismissSource> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.kind == ModalEventKind::CloseRequested)
            .filter_map(|e| e.source)
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Veto every event matching `predicate`.
pub fn veto_when<S: ScrollLockService>(
    modal: &mut ModalController<S>,
    predicate: impl Fn(&ModalEvent) -> bool + 'static,
) -> ListenerId {
    modal.subscribe(move |event| {
        if predicate(event) {
            event.prevent_default();
        }
    })
}

// --- Resource snapshots ---

/// Everything a controller holds at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSnapshot {
    pub state: ModalState,
    pub focus_trap: bool,
    pub scroll_lock: bool,
    pub escape_listener: bool,
    pub scroll_pinned: bool,
    pub lifecycle_timers: bool,
}

impl ResourceSnapshot {
    pub fn of<S: ScrollLockService>(modal: &ModalController<S>) -> Self {
        Self {
            state: modal.state(),
            focus_trap: modal.focus_trap_active(),
            scroll_lock: modal.holds_scroll_lock(),
            escape_listener: modal.has_escape_listener(),
            scroll_pinned: modal.document().is_scroll_pinned(),
            lifecycle_timers: modal.next_deadline().is_some(),
        }
    }

    /// What a fully open modal holds.
    pub const fn open() -> Self {
        Self {
            state: ModalState::Open,
            focus_trap: true,
            scroll_lock: true,
            escape_listener: true,
            scroll_pinned: true,
            lifecycle_timers: false,
        }
    }

    /// What a closed modal holds: nothing.
    pub const fn closed() -> Self {
        Self {
            state: ModalState::Closed,
            focus_trap: false,
            scroll_lock: false,
            escape_listener: false,
            scroll_pinned: false,
            lifecycle_timers: false,
        }
    }
}

// --- Property operations ---

/// One step of a randomized controller session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalOp {
    Show,
    Close,
    Escape,
    Tab,
    ShiftTab,
    ClickBackdrop,
    ClickCloseButton,
    ClickPanel,
    AutoClose(u64),
    Tick(u64),
}

/// Strategy over [`ModalOp`], weighted towards ticks so transitions
/// complete.
pub fn modal_op() -> impl Strategy<Value = ModalOp> {
    prop_oneof![
        2 => Just(ModalOp::Show),
        2 => Just(ModalOp::Close),
        1 => Just(ModalOp::Escape),
        1 => Just(ModalOp::Tab),
        1 => Just(ModalOp::ShiftTab),
        1 => Just(ModalOp::ClickBackdrop),
        1 => Just(ModalOp::ClickCloseButton),
        1 => Just(ModalOp::ClickPanel),
        1 => (1u64..2_000).prop_map(ModalOp::AutoClose),
        4 => (0u64..600).prop_map(ModalOp::Tick),
    ]
}

impl ModalOp {
    /// Apply to a controller built over `fixture`.
    pub fn apply(self, fixture: &ModalFixture, modal: &mut ModalController) {
        match self {
            Self::Show => modal.show(),
            Self::Close => modal.close(),
            Self::Escape => {
                modal.handle_event(&escape());
            }
            Self::Tab => {
                modal.handle_event(&tab());
            }
            Self::ShiftTab => {
                modal.handle_event(&shift_tab());
            }
            Self::ClickBackdrop => {
                modal.handle_event(&click(fixture.backdrop));
            }
            Self::ClickCloseButton => {
                modal.handle_event(&click(fixture.close_glyph));
            }
            Self::ClickPanel => {
                modal.handle_event(&click(fixture.input));
            }
            Self::AutoClose(ms) => {
                modal.schedule_auto_close(Duration::from_millis(ms));
            }
            Self::Tick(ms) => modal.tick(Duration::from_millis(ms)),
        }
    }
}
