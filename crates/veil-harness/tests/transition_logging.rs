#![forbid(unsafe_code)]

//! Integration tests: structured log output of the modal lifecycle.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;
use veil_harness::{ModalFixture, WINDOW, escape};
use veil_widgets::modal::ModalConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Captured {
    target: String,
    level: String,
    message: String,
    fields: Vec<(String, String)>,
}

impl Captured {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Visit for Captured {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.push((field.name().to_owned(), rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.push((field.name().to_owned(), value.to_owned()));
        }
    }
}

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut captured = Captured {
            target: meta.target().to_owned(),
            level: meta.level().to_string(),
            ..Captured::default()
        };
        event.record(&mut captured);
        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

impl Capture {
    fn transitions(&self) -> Vec<(String, String)> {
        self.events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.message == "modal state transition")
                    .filter_map(|e| {
                        Some((e.field("from")?.to_owned(), e.field("to")?.to_owned()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn with_message(&self, message: &str) -> Vec<Captured> {
        self.events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.message == message)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[test]
fn transitions_are_logged_at_debug() {
    let capture = Capture::default();
    let subscriber = Registry::default().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let f = ModalFixture::new();
        let mut modal = f.controller(ModalConfig::default());
        modal.show();
        modal.tick(WINDOW);
        modal.handle_event(&escape());
        modal.tick(WINDOW);
    });

    let expected: Vec<(String, String)> = [
        ("closed", "opening"),
        ("opening", "open"),
        ("open", "closing"),
        ("closing", "closed"),
    ]
    .iter()
    .map(|(from, to)| ((*from).to_owned(), (*to).to_owned()))
    .collect();
    assert_eq!(capture.transitions(), expected);
    for event in capture.with_message("modal state transition") {
        assert_eq!(event.target, "veil::modal");
        assert_eq!(event.level, "DEBUG");
    }
}

#[test]
fn veto_and_timers_are_traced() {
    let capture = Capture::default();
    let subscriber = Registry::default().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let f = ModalFixture::new();
        let mut modal = f.opened(ModalConfig::default());
        modal.subscribe(|event| event.prevent_default());
        modal.close();
    });

    let vetoes = capture.with_message("close vetoed");
    assert_eq!(vetoes.len(), 1);
    assert_eq!(vetoes[0].field("source"), Some("method"));
    assert!(!capture.with_message("timer fired").is_empty());
    assert!(
        capture
            .with_message("timer scheduled")
            .iter()
            .all(|e| e.level == "TRACE")
    );
}

#[test]
fn detached_panel_degrades_to_warning() {
    let capture = Capture::default();
    let subscriber = Registry::default().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let f = ModalFixture::new();
        f.doc.detach(f.host).unwrap();
        let mut modal = f.controller(ModalConfig::default());
        modal.show();
        modal.tick(WINDOW);
        assert!(!modal.focus_trap_active());
        modal.close();
        modal.tick(WINDOW);
        assert!(!f.doc.is_scroll_pinned());
    });

    let warnings = capture.with_message("focus trap not activated");
    assert!(!warnings.is_empty());
    assert!(warnings.iter().all(|e| e.level == "WARN"));
}
