// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The live document as a [`ControlTree`], plus small DOM helpers.

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use kurbo::Rect;
use reel_controls_core::locate::ControlTree;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, NodeList};

/// Class of the per-video overlay root.
pub const OVERLAY_CLASS: &str = "rc-overlay";

/// Class of the shared context menu root.
pub const MENU_CLASS: &str = "rc-context-menu";

/// Elements under either root belong to us.
const OWNED_SELECTOR: &str = ".rc-overlay, .rc-context-menu";

const CLICKABLE_SELECTOR: &str = "button, [role='button'], [tabindex]";

const VECTOR_SELECTOR: &str = "svg, path, use";

/// Attributes consulted for an accessible label, in order.
const LABEL_ATTRIBUTES: &[&str] = &["aria-label", "title", "data-tooltip", "data-tooltip-content"];

/// [`ControlTree`] over a live [`Document`].
#[derive(Clone, Debug)]
pub struct PageTree {
    document: Document,
}

impl PageTree {
    /// Wraps `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// The wrapped document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl ControlTree for PageTree {
    type Node = Element;

    fn rect(&self, node: &Element) -> Rect {
        rect_of(node)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn clickable_descendants(&self, root: &Element) -> Vec<Element> {
        root.query_selector_all(CLICKABLE_SELECTOR)
            .map(elements)
            .unwrap_or_default()
            .into_iter()
            .filter(|el| self.is_clickable(el))
            .collect()
    }

    fn clickables(&self) -> Vec<Element> {
        self.document
            .query_selector_all(CLICKABLE_SELECTOR)
            .map(elements)
            .unwrap_or_default()
            .into_iter()
            .filter(|el| self.is_clickable(el))
            .collect()
    }

    fn videos(&self) -> Vec<Element> {
        self.document
            .query_selector_all("video")
            .map(elements)
            .unwrap_or_default()
    }

    fn is_video(&self, node: &Element) -> bool {
        node.tag_name().eq_ignore_ascii_case("video")
    }

    fn is_clickable(&self, node: &Element) -> bool {
        is_clickable_markup(
            &node.tag_name(),
            node.get_attribute("role").as_deref(),
            node.get_attribute("tabindex").as_deref(),
        )
    }

    fn label(&self, node: &Element) -> Option<String> {
        LABEL_ATTRIBUTES
            .iter()
            .filter_map(|attr| node.get_attribute(attr))
            .find(|value| !value.trim().is_empty())
    }

    fn has_vector_icon(&self, node: &Element) -> bool {
        matches!(node.query_selector(VECTOR_SELECTOR), Ok(Some(_)))
    }

    fn is_overlay_owned(&self, node: &Element) -> bool {
        matches!(node.closest(OWNED_SELECTOR), Ok(Some(_)))
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        ancestor.contains(Some(node))
    }
}

/// Returns `true` for a `button`, `role="button"`, or a non-negative
/// `tabindex`.
#[must_use]
pub fn is_clickable_markup(tag: &str, role: Option<&str>, tabindex: Option<&str>) -> bool {
    tag.eq_ignore_ascii_case("button")
        || role.is_some_and(|role| role.trim().eq_ignore_ascii_case("button"))
        || tabindex
            .and_then(|value| value.trim().parse::<i32>().ok())
            .is_some_and(|index| index >= 0)
}

/// The element's bounding rectangle in viewport coordinates.
#[must_use]
pub fn rect_of(element: &Element) -> Rect {
    let r = element.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.right(), r.bottom())
}

/// The window's viewport rectangle, empty if unavailable.
#[must_use]
pub fn viewport() -> Rect {
    let Some(window) = web_sys::window() else {
        return Rect::ZERO;
    };
    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    Rect::new(0.0, 0.0, width, height)
}

/// Creates an element of `tag`.
pub fn element(doc: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    Ok(doc.create_element(tag)?.unchecked_into())
}

/// Creates an element of `tag` with `class`.
pub fn element_with_class(doc: &Document, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
    let el = element(doc, tag)?;
    el.set_class_name(class);
    Ok(el)
}

/// Sets a pixel-valued inline style property, rounded.
pub fn set_px(el: &HtmlElement, property: &str, value: f64) {
    let _ = el
        .style()
        .set_property(property, &format!("{}px", value.round()));
}

/// Adds an event listener for the lifetime of the page.
///
/// The closure is leaked, so this is for document and window listeners
/// only; anything tied to one video goes through [`listener`].
pub fn listen(
    target: &EventTarget,
    event: &str,
    capture: bool,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback_and_bool(
        event,
        closure.as_ref().unchecked_ref(),
        capture,
    )?;
    closure.forget();
    Ok(())
}

/// Adds an event listener that lives as long as the returned handle.
///
/// Dropping the handle removes the listener. The listener is not passive,
/// so `handler` may call `preventDefault`.
pub fn listener(
    target: &EventTarget,
    event: &'static str,
    capture: bool,
    handler: impl FnMut(&Event) + 'static,
) -> EventListener {
    let options = EventListenerOptions {
        phase: if capture {
            EventListenerPhase::Capture
        } else {
            EventListenerPhase::Bubble
        },
        passive: false,
    };
    EventListener::new_with_options(target, event, options, handler)
}

/// Stops `event` from reaching the host page's handlers.
pub fn stop(event: &Event) {
    event.stop_propagation();
}

/// Suppresses `event` entirely: default action and every later listener.
pub fn swallow(event: &Event) {
    event.prevent_default();
    event.stop_immediate_propagation();
}

/// The event target as an [`Element`], if it is one.
#[must_use]
pub fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|idx| list.item(idx))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clickable_markup() {
        assert!(is_clickable_markup("BUTTON", None, None), "button tag");
        assert!(is_clickable_markup("div", Some("button"), None), "button role");
        assert!(is_clickable_markup("div", None, Some("0")), "tabindex 0");
        assert!(!is_clickable_markup("div", None, Some("-1")), "negative tabindex");
        assert!(!is_clickable_markup("span", Some("link"), Some("x")), "no signal");
    }
}
