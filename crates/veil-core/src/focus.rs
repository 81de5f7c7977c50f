#![forbid(unsafe_code)]

//! Focusable-element queries.
//!
//! [`find_focusable`] is a pure function over a [`Document`]: given a
//! container it returns the descendants that participate in sequential
//! (Tab) navigation, in document order. It reads the tree and never mutates
//! it, so it can be exercised against static fixtures.
//!
//! An element is **tabbable** when it is connected, not inside a `hidden`
//! or `inert` subtree, not disabled, and either has `tabindex >= 0` or is
//! natively interactive (`button`, `select`, `textarea`, `input` other than
//! `type="hidden"`, `a`/`area` with `href`, `iframe`, `audio`/`video` with
//! `controls`, or `contenteditable`).
//!
//! An element is **focusable** (may receive programmatic focus) when it is
//! tabbable or carries any parseable `tabindex`, including negative values.

use crate::dom::{Document, ElementId};

/// Parsed `tabindex` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIndex {
    /// Negative value: focusable by script, skipped by Tab.
    ScriptOnly,
    /// Zero or positive: participates in Tab navigation.
    Sequential(i32),
}

impl TabIndex {
    /// Parse an attribute value. Returns `None` for unparseable input.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().parse::<i32>() {
            Ok(n) if n < 0 => Some(Self::ScriptOnly),
            Ok(n) => Some(Self::Sequential(n)),
            Err(_) => None,
        }
    }

    /// Whether Tab navigation reaches this element.
    pub fn is_sequential(self) -> bool {
        matches!(self, Self::Sequential(_))
    }
}

const FORM_CONTROLS: [&str; 4] = ["button", "input", "select", "textarea"];

fn tab_index(doc: &Document, id: ElementId) -> Option<TabIndex> {
    doc.attribute(id, "tabindex")
        .as_deref()
        .and_then(TabIndex::parse)
}

fn natively_interactive(doc: &Document, id: ElementId, tag: &str) -> bool {
    match tag {
        "button" | "select" | "textarea" | "iframe" => true,
        "input" => doc
            .attribute(id, "type")
            .is_none_or(|kind| !kind.eq_ignore_ascii_case("hidden")),
        "a" | "area" => doc.has_attribute(id, "href"),
        "audio" | "video" => doc.has_attribute(id, "controls"),
        _ => doc
            .attribute(id, "contenteditable")
            .is_some_and(|v| v.is_empty() || v.eq_ignore_ascii_case("true")),
    }
}

/// Whether the element or any ancestor hides it from interaction.
fn is_concealed(doc: &Document, id: ElementId) -> bool {
    let mut cursor = Some(id);
    while let Some(current) = cursor {
        if doc.has_attribute(current, "hidden") || doc.has_attribute(current, "inert") {
            return true;
        }
        cursor = doc.parent(current);
    }
    false
}

fn is_disabled(doc: &Document, id: ElementId, tag: &str) -> bool {
    FORM_CONTROLS.contains(&tag) && doc.has_attribute(id, "disabled")
}

/// Whether `id` can receive programmatic focus.
pub fn is_focusable(doc: &Document, id: ElementId) -> bool {
    let Some(tag) = doc.tag(id) else {
        return false;
    };
    if !doc.is_connected(id) || is_concealed(doc, id) || is_disabled(doc, id, &tag) {
        return false;
    }
    tab_index(doc, id).is_some() || natively_interactive(doc, id, &tag)
}

/// Whether `id` participates in sequential Tab navigation.
pub fn is_tabbable(doc: &Document, id: ElementId) -> bool {
    let Some(tag) = doc.tag(id) else {
        return false;
    };
    if !doc.is_connected(id) || is_concealed(doc, id) || is_disabled(doc, id, &tag) {
        return false;
    }
    match tab_index(doc, id) {
        Some(index) => index.is_sequential(),
        None => natively_interactive(doc, id, &tag),
    }
}

/// Tabbable descendants of `container` in document order.
///
/// The container itself is never included. A detached container yields an
/// empty list.
pub fn find_focusable(doc: &Document, container: ElementId) -> Vec<ElementId> {
    if !doc.is_connected(container) || is_concealed(doc, container) {
        return Vec::new();
    }
    doc.descendants(container)
        .into_iter()
        .filter(|&id| is_tabbable(doc, id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fixture() -> (Document, ElementId, Vec<ElementId>) {
        let doc = Document::new();
        let panel = doc.append_new(doc.body(), "div").unwrap();
        let button = doc.append_new(panel, "button").unwrap();
        let link = doc.append_new(panel, "a").unwrap();
        doc.set_attribute(link, "href", "#").unwrap();
        let bare_link = doc.append_new(panel, "a").unwrap();
        let hidden_input = doc.append_new(panel, "input").unwrap();
        doc.set_attribute(hidden_input, "type", "hidden").unwrap();
        let text_input = doc.append_new(panel, "input").unwrap();
        let disabled = doc.append_new(panel, "button").unwrap();
        doc.set_attribute(disabled, "disabled", "").unwrap();
        let section = doc.append_new(panel, "section").unwrap();
        doc.set_attribute(section, "hidden", "").unwrap();
        let concealed = doc.append_new(section, "button").unwrap();
        let custom = doc.append_new(panel, "div").unwrap();
        doc.set_attribute(custom, "tabindex", "0").unwrap();
        let script_only = doc.append_new(panel, "button").unwrap();
        doc.set_attribute(script_only, "tabindex", "-1").unwrap();
        let editable = doc.append_new(panel, "div").unwrap();
        doc.set_attribute(editable, "contenteditable", "true").unwrap();
        let _ = (bare_link, concealed);
        (doc, panel, vec![button, link, text_input, custom, editable])
    }

    #[test]
    fn tab_index_parse() {
        assert_eq!(TabIndex::parse("0"), Some(TabIndex::Sequential(0)));
        assert_eq!(TabIndex::parse(" 3 "), Some(TabIndex::Sequential(3)));
        assert_eq!(TabIndex::parse("-1"), Some(TabIndex::ScriptOnly));
        assert_eq!(TabIndex::parse("abc"), None);
    }

    #[test]
    fn finds_tabbable_descendants_in_document_order() {
        let (doc, panel, expected) = fixture();
        assert_eq!(find_focusable(&doc, panel), expected);
    }

    #[test]
    fn container_is_never_included() {
        let doc = Document::new();
        let panel = doc.append_new(doc.body(), "button").unwrap();
        assert!(find_focusable(&doc, panel).is_empty());
    }

    #[test]
    fn detached_container_yields_nothing() {
        let (doc, panel, _) = fixture();
        doc.detach(panel).unwrap();
        assert!(find_focusable(&doc, panel).is_empty());
    }

    #[test]
    fn script_only_elements_are_focusable_but_not_tabbable() {
        let doc = Document::new();
        let div = doc.append_new(doc.body(), "div").unwrap();
        doc.set_attribute(div, "tabindex", "-1").unwrap();
        assert!(is_focusable(&doc, div));
        assert!(!is_tabbable(&doc, div));
    }

    #[test]
    fn inert_subtree_is_skipped() {
        let (doc, panel, expected) = fixture();
        doc.set_attribute(panel, "inert", "").unwrap();
        assert!(find_focusable(&doc, panel).is_empty());
        doc.remove_attribute(panel, "inert");
        assert_eq!(find_focusable(&doc, panel), expected);
    }

    proptest! {
        #[test]
        fn result_is_subset_in_document_order(flags in proptest::collection::vec(0u8..4, 1..24)) {
            let doc = Document::new();
            let panel = doc.append_new(doc.body(), "div").unwrap();
            let mut parent = panel;
            for (i, flag) in flags.iter().enumerate() {
                let tag = if flag % 2 == 0 { "button" } else { "span" };
                let el = doc.append_new(parent, tag).unwrap();
                if *flag == 3 {
                    doc.set_attribute(el, "tabindex", "0").unwrap();
                }
                if i % 5 == 4 {
                    parent = el;
                }
            }
            let found = find_focusable(&doc, panel);
            let order = doc.descendants(panel);
            let positions: Vec<usize> = found
                .iter()
                .map(|id| order.iter().position(|o| o == id).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            for id in found {
                prop_assert!(is_tabbable(&doc, id));
                prop_assert!(doc.contains(panel, id));
            }
        }
    }
}
