// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clipboard writes.
//!
//! The async Clipboard API is tried first; if it is missing or rejects, a
//! hidden `<textarea>` is selected and copied with `execCommand("copy")`.
//! Neither path throws: the outcome is a `bool`.

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlDocument, HtmlTextAreaElement};

/// Copies `text` to the clipboard. Returns `true` on success.
pub async fn copy_text(text: &str) -> bool {
    if write_async(text).await {
        return true;
    }
    copy_with_selection(text).unwrap_or(false)
}

async fn write_async(text: &str) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    // Looked up reflectively: `navigator.clipboard` is absent on insecure
    // origins and older engines.
    let navigator = window.navigator();
    let Ok(clipboard) = Reflect::get(&navigator, &JsValue::from_str("clipboard")) else {
        return false;
    };
    if clipboard.is_undefined() || clipboard.is_null() {
        return false;
    }
    let Some(write) = Reflect::get(&clipboard, &JsValue::from_str("writeText"))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
    else {
        return false;
    };
    let Some(promise) = write
        .call1(&clipboard, &JsValue::from_str(text))
        .ok()
        .and_then(|p| p.dyn_into::<Promise>().ok())
    else {
        return false;
    };
    JsFuture::from(promise).await.is_ok()
}

fn copy_with_selection(text: &str) -> Result<bool, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?;

    let textarea: HtmlTextAreaElement = document.create_element("textarea")?.unchecked_into();
    textarea.set_value(text);
    textarea.set_attribute("style", "position: fixed; opacity: 0; left: -9999px;")?;
    body.append_child(&textarea)?;
    textarea.select();
    let copied = document.unchecked_ref::<HtmlDocument>().exec_command("copy");
    textarea.remove();
    copied
}
