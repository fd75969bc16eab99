// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page Scanner: re-scans for videos whenever the document subtree changes.

use std::rc::Rc;

use js_sys::Array;
use reel_controls_core::locate::ControlTree as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord};

use crate::session::Session;

/// Observes child-list changes anywhere under the document element.
///
/// Mutations only queue a scan; the session coalesces scans to one per
/// animation frame. Batches that touch nothing but our own overlays (time
/// readout, value flash) are ignored. The observer lives as long as the
/// page.
pub(crate) fn start(session: &Rc<Session>) -> Result<(), JsValue> {
    let Some(root) = session.document.document_element() else {
        return Ok(());
    };
    let weak = Rc::downgrade(session);
    let callback = Closure::wrap(Box::new(move |records: Array, _observer: JsValue| {
        let Some(session) = weak.upgrade() else {
            return;
        };
        let foreign = records.iter().any(|record| {
            let target = record
                .unchecked_into::<MutationRecord>()
                .target()
                .and_then(|node| node.dyn_into::<Element>().ok());
            target.is_none_or(|el| !session.tree.is_overlay_owned(&el))
        });
        if foreign {
            session.schedule_scan();
        }
    }) as Box<dyn FnMut(Array, JsValue)>);

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer.observe_with_options(&root, &options)?;
    callback.forget();
    Ok(())
}
