#![forbid(unsafe_code)]

//! Minimal, deterministic document model.
//!
//! [`Document`] stands in for the browser document that hosts a modal
//! surface. It owns an arena of elements rooted at `<body>`, tracks the
//! active (focused) element, the vertical scroll offset, scroll pinning,
//! and the ledger of document-level key listeners.
//!
//! `Document` is a cheap-to-clone handle (`Rc<RefCell<..>>`): every
//! collaborator that touches the document (focus trap, scroll lock,
//! announcer) holds its own clone. The model is single-threaded.
//!
//! # Invariants
//!
//! 1. Element ids are never reused. A removed element's id stays invalid.
//! 2. The tree is acyclic: appending an element under one of its own
//!    descendants fails with [`DomError::HierarchyRequest`].
//! 3. The active element, when set, is always connected to `<body>`.
//!    Detaching a subtree that contains focus clears focus.
//! 4. While scrolling is pinned, user scrolling has no effect.
//! 5. Scroll pinning is counted per document: it lasts while any
//!    [`ScrollHold`] is outstanding, whoever took it.
//!
//! # Failure Modes
//!
//! - Operations on unknown or removed ids return [`DomError::UnknownElement`].
//! - Read accessors on unknown ids return `None` / empty values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::{AHashMap, AHashSet};

/// Opaque handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    /// Raw arena index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle for a registered document-level key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyListenerId(u64);

/// Hold ids are unique across documents, so a hold taken on one document
/// never releases another document's hold.
static SCROLL_HOLD_COUNTER: AtomicU64 = AtomicU64::new(1);

/// One outstanding scroll hold, as returned by [`Document::hold_scroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollHold {
    pub id: u64,
    /// Offset the document was pinned at by its first hold.
    pub offset: i32,
}

/// Errors raised by tree mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The id does not refer to a live element.
    #[error("unknown element {0}")]
    UnknownElement(ElementId),
    /// The mutation would make an element its own ancestor.
    #[error("cannot insert {child} under {parent}: {child} is an ancestor")]
    HierarchyRequest { parent: ElementId, child: ElementId },
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: AHashMap<String, String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    text: String,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: AHashMap::new(),
            parent: None,
            children: Vec::new(),
            text: String::new(),
        }
    }
}

#[derive(Debug)]
struct DocumentInner {
    elements: Vec<Option<Element>>,
    body: ElementId,
    active: Option<ElementId>,
    scroll_y: i32,
    pinned_at: Option<i32>,
    scroll_holds: AHashSet<u64>,
    key_listeners: AHashMap<KeyListenerId, &'static str>,
    next_listener: u64,
}

impl DocumentInner {
    fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn require(&self, id: ElementId) -> Result<&Element, DomError> {
        self.get(id).ok_or(DomError::UnknownElement(id))
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(|el| el.parent);
        }
        false
    }

    fn detach(&mut self, id: ElementId) {
        let parent = self.get(id).and_then(|el| el.parent);
        if let Some(parent) = parent
            && let Some(parent_el) = self.get_mut(parent)
        {
            parent_el.children.retain(|&child| child != id);
        }
        if let Some(el) = self.get_mut(id) {
            el.parent = None;
        }
    }

    fn subtree(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(el) = self.get(id) {
                out.push(id);
                stack.extend(el.children.iter().rev().copied());
            }
        }
        out
    }
}

/// Shared handle to a document tree.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("elements", &inner.elements.iter().flatten().count())
            .field("active", &inner.active)
            .field("scroll_y", &inner.scroll_y)
            .field("pinned_at", &inner.pinned_at)
            .field("scroll_holds", &inner.scroll_holds.len())
            .field("key_listeners", &inner.key_listeners.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only `<body>`.
    pub fn new() -> Self {
        let body = ElementId(0);
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                elements: vec![Some(Element::new("body"))],
                body,
                active: None,
                scroll_y: 0,
                pinned_at: None,
                scroll_holds: AHashSet::new(),
                key_listeners: AHashMap::new(),
                next_listener: 1,
            })),
        }
    }

    /// Whether two handles refer to the same document.
    pub fn same_document(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The `<body>` element.
    pub fn body(&self) -> ElementId {
        self.inner.borrow().body
    }

    // --- Tree ---

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> ElementId {
        let mut inner = self.inner.borrow_mut();
        let id = ElementId(inner.elements.len() as u32);
        inner.elements.push(Some(Element::new(tag)));
        id
    }

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already attached elsewhere.
    pub fn append_child(&self, parent: ElementId, child: ElementId) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        inner.require(parent)?;
        inner.require(child)?;
        if inner.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        inner.detach(child);
        if let Some(el) = inner.get_mut(child) {
            el.parent = Some(parent);
        }
        if let Some(el) = inner.get_mut(parent) {
            el.children.push(child);
        }
        Ok(())
    }

    /// Create an element and append it to `parent` in one step.
    pub fn append_new(&self, parent: ElementId, tag: &str) -> Result<ElementId, DomError> {
        let id = self.create_element(tag);
        match self.append_child(parent, id) {
            Ok(()) => Ok(id),
            Err(err) => {
                self.inner.borrow_mut().elements[id.index()] = None;
                Err(err)
            }
        }
    }

    /// Detach an element (and its subtree) from the tree without
    /// destroying it. Clears focus if focus was inside the subtree.
    pub fn detach(&self, id: ElementId) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        inner.require(id)?;
        if id == inner.body {
            return Err(DomError::HierarchyRequest {
                parent: inner.body,
                child: id,
            });
        }
        if let Some(active) = inner.active
            && inner.contains(id, active)
        {
            inner.active = None;
        }
        inner.detach(id);
        Ok(())
    }

    /// Detach and destroy an element and its subtree.
    ///
    /// Returns the number of elements destroyed.
    pub fn remove(&self, id: ElementId) -> Result<usize, DomError> {
        self.detach(id)?;
        let mut inner = self.inner.borrow_mut();
        let doomed = inner.subtree(id);
        for &el in &doomed {
            inner.elements[el.index()] = None;
        }
        Ok(doomed.len())
    }

    /// Whether `id` refers to a live (not removed) element.
    pub fn exists(&self, id: ElementId) -> bool {
        self.inner.borrow().get(id).is_some()
    }

    /// Whether `id` is attached (transitively) to `<body>`.
    pub fn is_connected(&self, id: ElementId) -> bool {
        let inner = self.inner.borrow();
        inner.get(id).is_some() && inner.contains(inner.body, id)
    }

    /// Inclusive ancestry test: `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let inner = self.inner.borrow();
        inner.get(ancestor).is_some() && inner.contains(ancestor, node)
    }

    /// Parent of an element.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.inner.borrow().get(id).and_then(|el| el.parent)
    }

    /// Children of an element in document order.
    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.inner
            .borrow()
            .get(id)
            .map(|el| el.children.clone())
            .unwrap_or_default()
    }

    /// Descendants of an element in document (pre-)order, excluding itself.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let inner = self.inner.borrow();
        let mut all = inner.subtree(id);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    /// Number of live elements (attached or not), including `<body>`.
    pub fn element_count(&self) -> usize {
        self.inner.borrow().elements.iter().flatten().count()
    }

    /// Lowercase tag name.
    pub fn tag(&self, id: ElementId) -> Option<String> {
        self.inner.borrow().get(id).map(|el| el.tag.clone())
    }

    /// Text content of the element itself (not of its children).
    pub fn text(&self, id: ElementId) -> Option<String> {
        self.inner.borrow().get(id).map(|el| el.text.clone())
    }

    /// Replace the element's own text content.
    pub fn set_text(&self, id: ElementId, text: impl Into<String>) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        let el = inner.get_mut(id).ok_or(DomError::UnknownElement(id))?;
        el.text = text.into();
        Ok(())
    }

    // --- Attributes ---

    /// Read an attribute.
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .get(id)
            .and_then(|el| el.attributes.get(name).cloned())
    }

    /// Whether an attribute is present (boolean attributes).
    pub fn has_attribute(&self, id: ElementId, name: &str) -> bool {
        self.inner
            .borrow()
            .get(id)
            .is_some_and(|el| el.attributes.contains_key(name))
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(
        &self,
        id: ElementId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let mut inner = self.inner.borrow_mut();
        let el = inner.get_mut(id).ok_or(DomError::UnknownElement(id))?;
        el.attributes.insert(name.to_ascii_lowercase(), value.into());
        Ok(())
    }

    /// Remove an attribute. Returns the previous value.
    pub fn remove_attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.inner
            .borrow_mut()
            .get_mut(id)
            .and_then(|el| el.attributes.remove(name))
    }

    // --- Focus ---

    /// The currently focused element.
    pub fn active_element(&self) -> Option<ElementId> {
        self.inner.borrow().active
    }

    /// Move focus to `id`.
    ///
    /// Returns `Ok(false)` (focus unchanged) when the element is detached or
    /// cannot receive focus, mirroring `HTMLElement.focus()` silently doing
    /// nothing.
    pub fn focus(&self, id: ElementId) -> Result<bool, DomError> {
        self.inner.borrow().require(id)?;
        if !self.is_connected(id) || !crate::focus::is_focusable(self, id) {
            return Ok(false);
        }
        self.inner.borrow_mut().active = Some(id);
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "veil::dom", element = %id, "focus moved");
        Ok(true)
    }

    /// Clear focus.
    pub fn blur(&self) {
        self.inner.borrow_mut().active = None;
    }

    // --- Scrolling ---

    /// Current vertical scroll offset in pixels.
    pub fn scroll_y(&self) -> i32 {
        self.inner.borrow().scroll_y
    }

    /// Programmatic scroll (`window.scrollTo`). Ignored while pinned.
    pub fn scroll_to(&self, y: i32) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.pinned_at.is_some() {
            return false;
        }
        inner.scroll_y = y.max(0);
        true
    }

    /// User-initiated scroll (wheel, touch, keyboard). Ignored while pinned.
    pub fn user_scroll_by(&self, dy: i32) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.pinned_at.is_some() {
            return false;
        }
        inner.scroll_y = inner.scroll_y.saturating_add(dy).max(0);
        true
    }

    /// Take a scroll hold. The first hold pins the viewport at the current
    /// offset (`body { position: fixed; top: -offset }`); later holds share
    /// that offset.
    pub fn hold_scroll(&self) -> ScrollHold {
        let mut inner = self.inner.borrow_mut();
        let current = inner.scroll_y;
        let offset = *inner.pinned_at.get_or_insert(current);
        let id = SCROLL_HOLD_COUNTER.fetch_add(1, Ordering::Relaxed);
        inner.scroll_holds.insert(id);
        ScrollHold { id, offset }
    }

    /// Give a hold back. The last release unpins and scrolls back to the
    /// pinned offset. Returns `false` for an id this document does not hold.
    pub fn release_scroll(&self, id: u64) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.scroll_holds.remove(&id) {
            return false;
        }
        if inner.scroll_holds.is_empty()
            && let Some(offset) = inner.pinned_at.take()
        {
            inner.scroll_y = offset;
        }
        true
    }

    /// Number of outstanding scroll holds.
    pub fn scroll_holds(&self) -> usize {
        self.inner.borrow().scroll_holds.len()
    }

    /// Offset scrolling is pinned at, if pinned.
    pub fn pinned_offset(&self) -> Option<i32> {
        self.inner.borrow().pinned_at
    }

    /// Whether scrolling is currently pinned.
    pub fn is_scroll_pinned(&self) -> bool {
        self.inner.borrow().pinned_at.is_some()
    }

    // --- Document-level key listeners ---

    /// Register a document-level key listener.
    pub fn add_key_listener(&self, label: &'static str) -> KeyListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = KeyListenerId(inner.next_listener);
        inner.next_listener += 1;
        inner.key_listeners.insert(id, label);
        id
    }

    /// Remove a key listener. Returns whether it was registered.
    pub fn remove_key_listener(&self, id: KeyListenerId) -> bool {
        self.inner.borrow_mut().key_listeners.remove(&id).is_some()
    }

    /// Whether a key listener is still registered.
    pub fn has_key_listener(&self, id: KeyListenerId) -> bool {
        self.inner.borrow().key_listeners.contains_key(&id)
    }

    /// Number of registered document-level key listeners.
    pub fn key_listener_count(&self) -> usize {
        self.inner.borrow().key_listeners.len()
    }

    /// Labels of registered key listeners, for leak diagnostics.
    pub fn key_listener_labels(&self) -> Vec<&'static str> {
        let inner = self.inner.borrow();
        let mut labels: Vec<_> = inner.key_listeners.values().copied().collect();
        labels.sort_unstable();
        labels
    }

    /// Elements carrying the given attribute value, in document order.
    pub fn query_attribute(&self, name: &str, value: &str) -> Vec<ElementId> {
        let inner = self.inner.borrow();
        inner
            .subtree(inner.body)
            .into_iter()
            .filter(|&id| {
                inner
                    .get(id)
                    .and_then(|el| el.attributes.get(name))
                    .is_some_and(|v| v == value)
            })
            .collect()
    }

    /// Distinct tags currently attached under `<body>`.
    pub fn connected_tags(&self) -> AHashSet<String> {
        let inner = self.inner.borrow();
        inner
            .subtree(inner.body)
            .into_iter()
            .filter_map(|id| inner.get(id).map(|el| el.tag.clone()))
            .collect()
    }
}
