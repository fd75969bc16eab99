// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Custom controls over third-party web video.
//!
//! Loaded into a page it does not own, this crate finds every `<video>`,
//! lays a control overlay (volume popover, seek bar, time readout) over it,
//! keeps the overlay aligned with the host's own player UI, and adds a
//! "share current timestamp" context menu whose links seek the right video
//! on arrival.
//!
//! ```text
//!   MutationObserver ──► Session::scan ──► Session::attach ──► UiContext
//!                                                 │               │
//!                             Locator (core) ◄────┘       overlay / layout
//!                                                            │
//!                            audio ◄── clicks, slider ───────┤
//!                         deeplink ◄── URL, durationchange ──┘
//! ```
//!
//! Build with: `wasm-pack build --target web reel_controls`

#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

mod audio;
mod context;
mod deeplink;
mod overlay;
mod scanner;
mod session;
mod share;
mod style;

use std::rc::Rc;

use reel_controls_core::config::OverlayConfig;
use reel_controls_core::label::TermSet;
use reel_controls_core::locate::{ControlTree as _, LocateTier, Located};
use reel_controls_web::dom::{listen, target_element};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlAnchorElement, Window};

use crate::session::{BOUND_ATTR, Session};

/// Entry point: starts the overlay once the document is parsed.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    let window = web_sys::window().expect("window");
    let document = window.document().expect("document");

    if document.ready_state() == "loading" {
        let target = document.clone();
        listen(&target, "DOMContentLoaded", false, move |_| {
            let _ = start(window.clone(), document.clone());
        })?;
        return Ok(());
    }
    start(window, document)
}

fn start(window: Window, document: Document) -> Result<(), JsValue> {
    style::install(&document)?;
    let session = Session::new(window, document, OverlayConfig::default());
    install_global_listeners(&session)?;
    share::install(&session)?;
    scanner::start(&session)?;
    session.scan();
    Ok(())
}

/// Document and window listeners shared by all contexts.
///
/// Order matters: the activation gate must see a gesture before the volume
/// heuristics swallow it.
fn install_global_listeners(session: &Rc<Session>) -> Result<(), JsValue> {
    let doc = session.document.clone();
    let window = session.window.clone();

    for name in ["click", "keydown"] {
        let s = Rc::clone(session);
        listen(&doc, name, true, move |event| audio::gesture(&s, &event))?;
    }

    let s = Rc::clone(session);
    listen(&doc, "click", true, move |event| {
        on_volume_target(&s, &event, false);
    })?;
    let s = Rc::clone(session);
    listen(&doc, "dblclick", true, move |event| {
        on_volume_target(&s, &event, true);
    })?;

    let s = Rc::clone(session);
    listen(&doc, "click", true, move |event| {
        let anchor = target_element(&event)
            .and_then(|target| target.closest("a[href]").ok().flatten())
            .and_then(|el| el.dyn_into::<HtmlAnchorElement>().ok());
        if let Some(anchor) = anchor {
            deeplink::remember_anchor(&s, &anchor);
        }
    })?;

    let s = Rc::clone(session);
    listen(&doc, "pointerdown", true, move |event| {
        let Some(target) = target_element(&event) else {
            return;
        };
        for ctx in s.contexts() {
            if ctx.is_popover_open() && !ctx.owns_pointer_target(&target) {
                ctx.close_popover();
            }
        }
    })?;

    for (name, capture) in [("scroll", true), ("resize", false)] {
        let s = Rc::clone(session);
        listen(&window, name, capture, move |_| {
            for ctx in s.contexts() {
                ctx.schedule_layout();
            }
        })?;
    }

    let s = Rc::clone(session);
    listen(&window, "popstate", false, move |_| {
        s.check_navigation();
        s.schedule_scan();
    })?;
    Ok(())
}

/// Click heuristic for volume controls the scan has not bound yet.
///
/// Bound controls are skipped: their own listeners handle the event when it
/// reaches them.
fn on_volume_target(session: &Rc<Session>, event: &Event, double: bool) {
    let Some(target) = target_element(event) else {
        return;
    };
    let locator = session.locator();
    let Some(button) = locator.volume_button_from_target(&target) else {
        return;
    };
    if button.get_attribute(BOUND_ATTR).as_deref() == Some("1") {
        return;
    }
    let ctx = match session.context_for_button(&button) {
        Some(ctx) => ctx,
        None => {
            let Some(video) = locator.video_for_button(&button) else {
                return;
            };
            let Some(ctx) = session.attach(&video) else {
                return;
            };
            ctx
        }
    };
    let labeled = session
        .tree
        .label(&button)
        .is_some_and(|label| TermSet::Volume.matches(&label));
    let tier = if labeled {
        LocateTier::Labeled
    } else {
        LocateTier::Geometric
    };
    session.bind_native_button(
        &ctx,
        Located {
            node: button,
            tier,
        },
    );
    if double {
        ctx.handle_volume_double_click(session, event);
    } else {
        ctx.handle_volume_click(session, event);
    }
}
