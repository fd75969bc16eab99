// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Share Context Menu: right-click on a video copies a timestamp link.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use kurbo::{Point, Size};
use reel_controls_core::layout::clamp_into;
use reel_controls_core::timestamp::build_share_url;
use reel_controls_web::dom::{
    MENU_CLASS, element_with_class, listen, rect_of, set_px, stop, swallow, target_element,
    viewport,
};
use reel_controls_web::{TimerSlot, copy_text, current_url};
use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, HtmlElement, KeyboardEvent, MouseEvent};

use crate::context::UiContext;
use crate::session::Session;

const LABEL_IDLE: &str = "Share current timestamp";
const LABEL_COPIED: &str = "Copied timestamp link";
const LABEL_FAILED: &str = "Copy failed";

/// Padding between the menu and the viewport edges.
const VIEWPORT_PADDING: f64 = 8.0;

/// The single page-wide share menu.
pub(crate) struct ShareMenu {
    root: HtmlElement,
    item: HtmlElement,
    open: Cell<bool>,
    /// Context the menu was opened for.
    active: RefCell<Option<Weak<UiContext>>>,
    revert: TimerSlot,
}

impl ShareMenu {
    fn build(session: &Session) -> Result<Self, JsValue> {
        let doc = &session.document;
        let root = element_with_class(doc, "div", MENU_CLASS)?;
        root.set_attribute("role", "menu")?;
        root.set_hidden(true);
        let item = element_with_class(doc, "button", "rc-context-menu-item")?;
        item.set_attribute("type", "button")?;
        item.set_attribute("role", "menuitem")?;
        item.set_text_content(Some(LABEL_IDLE));
        root.append_child(&item)?;
        let parent: Element = match doc.body() {
            Some(body) => body.into(),
            None => doc
                .document_element()
                .ok_or_else(|| JsValue::from_str("document has no root element"))?,
        };
        parent.append_child(&root)?;
        Ok(Self {
            root,
            item,
            open: Cell::new(false),
            active: RefCell::new(None),
            revert: TimerSlot::new(),
        })
    }

    fn show(&self, ctx: &Rc<UiContext>, at: Point) {
        self.revert.cancel();
        self.item.set_text_content(Some(LABEL_IDLE));
        *self.active.borrow_mut() = Some(Rc::downgrade(ctx));
        self.root.set_hidden(false);
        self.open.set(true);

        let size = Size::new(
            f64::from(self.root.offset_width()),
            f64::from(self.root.offset_height()),
        );
        let origin = clamp_into(at, size, viewport(), VIEWPORT_PADDING);
        set_px(&self.root, "left", origin.x);
        set_px(&self.root, "top", origin.y);
    }

    pub(crate) fn close(&self) {
        if !self.open.replace(false) {
            return;
        }
        self.revert.cancel();
        self.root.set_hidden(true);
        self.item.set_text_content(Some(LABEL_IDLE));
        self.active.borrow_mut().take();
    }

    fn contains(&self, target: &Element) -> bool {
        self.root.contains(Some(target))
    }

    /// Shows the copy outcome, then closes.
    fn report(&self, session: &Rc<Session>, copied: bool) {
        session.trace(|t| t.share(copied));
        if !self.open.get() {
            return;
        }
        self.item
            .set_text_content(Some(if copied { LABEL_COPIED } else { LABEL_FAILED }));
        let weak = Rc::downgrade(session);
        self.revert
            .schedule(session.config.timing.share_label_ms, move || {
                if let Some(menu) = weak.upgrade().as_deref().and_then(|s| s.menu.get()) {
                    menu.close();
                }
            });
    }
}

impl std::fmt::Debug for ShareMenu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareMenu")
            .field("open", &self.open.get())
            .field("revert", &self.revert)
            .finish_non_exhaustive()
    }
}

/// Creates the menu and installs its listeners.
pub(crate) fn install(session: &Rc<Session>) -> Result<(), JsValue> {
    let menu = ShareMenu::build(session)?;
    wire_item(session, &menu.item)?;
    if session.menu.set(menu).is_err() {
        return Ok(());
    }
    let doc = &session.document;

    let weak = Rc::downgrade(session);
    listen(doc, "contextmenu", true, move |event| {
        if let Some(session) = weak.upgrade() {
            on_context_menu(&session, &event);
        }
    })?;

    let weak = Rc::downgrade(session);
    listen(doc, "pointerdown", true, move |event| {
        let Some(session) = weak.upgrade() else {
            return;
        };
        let Some(menu) = session.menu.get() else {
            return;
        };
        let inside = target_element(&event).is_some_and(|target| menu.contains(&target));
        if !inside {
            menu.close();
        }
    })?;

    let weak = Rc::downgrade(session);
    listen(doc, "keydown", true, move |event| {
        let escape = event
            .dyn_ref::<KeyboardEvent>()
            .is_some_and(|key| key.key() == "Escape");
        if escape && let Some(menu) = weak.upgrade().as_deref().and_then(|s| s.menu.get()) {
            menu.close();
        }
    })?;

    for (name, capture) in [("scroll", true), ("resize", false)] {
        let weak = Rc::downgrade(session);
        listen(&session.window, name, capture, move |_| {
            if let Some(menu) = weak.upgrade().as_deref().and_then(|s| s.menu.get()) {
                menu.close();
            }
        })?;
    }
    Ok(())
}

fn wire_item(session: &Rc<Session>, item: &HtmlElement) -> Result<(), JsValue> {
    let weak = Rc::downgrade(session);
    listen(item, "click", false, move |event| {
        swallow(&event);
        let Some(session) = weak.upgrade() else {
            return;
        };
        let Some(menu) = session.menu.get() else {
            return;
        };
        let ctx = menu.active.borrow().as_ref().and_then(Weak::upgrade);
        let Some(ctx) = ctx else {
            menu.close();
            return;
        };
        let Some(page_url) = current_url() else {
            menu.close();
            return;
        };
        let candidates = permalink_candidates(&session, &ctx, &page_url);
        let url = build_share_url(
            ctx.video.current_time(),
            candidates.iter().map(String::as_str),
            &page_url,
        );
        spawn_local(async move {
            let copied = copy_text(&url).await;
            if let Some(menu) = session.menu.get() {
                menu.report(&session, copied);
            }
        });
    })?;
    listen(item, "pointerdown", false, |event| stop(&event))
}

fn on_context_menu(session: &Rc<Session>, event: &Event) {
    let Some(target) = target_element(event) else {
        return;
    };
    let Some(menu) = session.menu.get() else {
        return;
    };
    if menu.contains(&target) {
        swallow(event);
        return;
    }
    let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
        return;
    };
    let point = Point::new(f64::from(mouse.client_x()), f64::from(mouse.client_y()));
    let video = match target.closest("video") {
        Ok(Some(video)) => Some(video),
        _ => session.video_at(point),
    };
    let Some(video) = video else {
        return;
    };
    let Some(ctx) = session.attach(&video) else {
        return;
    };
    swallow(event);
    menu.show(&ctx, point);
}

/// Hrefs that may be the content's permalink, best first: the page itself,
/// anchors near the video (closest ancestor first), then the canonical link.
fn permalink_candidates(session: &Session, ctx: &UiContext, page_url: &str) -> Vec<String> {
    let mut out = vec![page_url.to_owned()];
    let video_rect = rect_of(&ctx.video);
    let mut level: Option<Element> = Some(ctx.host.clone().into());
    for _ in 0..session.config.matching.ancestor_depth {
        let Some(node) = level else {
            break;
        };
        if let Ok(anchors) = node.query_selector_all("a[href]") {
            let mut found: Vec<(f64, String)> = (0..anchors.length())
                .filter_map(|idx| anchors.item(idx))
                .filter_map(|n| n.dyn_into::<Element>().ok())
                .filter_map(|a| {
                    let href = a.get_attribute("href")?;
                    let distance = (rect_of(&a).center() - video_rect.center()).hypot();
                    Some((distance, href))
                })
                .collect();
            found.sort_by(|a, b| a.0.total_cmp(&b.0));
            out.extend(found.into_iter().map(|(_, href)| href));
        }
        level = node.parent_element();
    }
    if let Ok(Some(link)) = session.document.query_selector("link[rel='canonical'][href]")
        && let Some(href) = link.get_attribute("href")
    {
        out.push(href);
    }
    out
}
