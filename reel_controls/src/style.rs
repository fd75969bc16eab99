// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay stylesheet.

use wasm_bindgen::JsValue;
use web_sys::Document;

const STYLE_ID: &str = "rc-style";

const CSS: &str = r#"
.rc-overlay {
  position: absolute;
  pointer-events: none;
  z-index: 2147483000;
  --rc-progress-left: 24px;
  --rc-progress-right: 24px;
}
.rc-overlay > * { pointer-events: auto; }
.rc-volume-popover {
  position: absolute;
  display: none;
  flex-direction: column;
  align-items: center;
  gap: 4px;
  padding: 8px 6px;
  border-radius: 8px;
  background: rgba(0, 0, 0, 0.72);
}
.rc-volume-popover.rc-open { display: flex; }
.rc-volume-slider {
  writing-mode: vertical-lr;
  direction: rtl;
  height: 96px;
  width: 20px;
}
.rc-volume-value {
  font: 600 11px/1 system-ui, sans-serif;
  color: #fff;
  opacity: 0;
  transition: opacity 120ms;
}
.rc-volume-popover.rc-show-value .rc-volume-value { opacity: 1; }
.rc-progress {
  position: absolute;
  left: var(--rc-progress-left);
  right: var(--rc-progress-right);
  bottom: 12px;
  display: flex;
  align-items: center;
  gap: 8px;
  color: #fff;
  font: 500 12px/1 system-ui, sans-serif;
}
.rc-overlay.rc-reels .rc-progress { bottom: 6px; }
.rc-overlay.rc-compact .rc-time { display: none; }
.rc-status {
  all: unset;
  cursor: pointer;
  width: 20px;
  height: 20px;
}
.rc-status svg { width: 20px; height: 20px; fill: currentColor; }
.rc-status .rc-icon-play { display: none; }
.rc-status.rc-paused .rc-icon-play { display: block; }
.rc-status.rc-paused .rc-icon-pause { display: none; }
.rc-time { white-space: nowrap; text-shadow: 0 1px 2px rgba(0, 0, 0, 0.6); }
.rc-seek { flex: 1; min-width: 0; }
.rc-context-menu {
  position: fixed;
  z-index: 2147483647;
  padding: 4px;
  border-radius: 6px;
  background: #fff;
  box-shadow: 0 4px 16px rgba(0, 0, 0, 0.25);
}
.rc-context-menu-item {
  all: unset;
  display: block;
  padding: 6px 12px;
  font: 14px/1.3 system-ui, sans-serif;
  color: #111;
  cursor: pointer;
}
.rc-context-menu-item:hover { background: #f0f0f0; }
"#;

/// Adds the stylesheet to `<head>` unless it is already there.
pub(crate) fn install(doc: &Document) -> Result<(), JsValue> {
    if doc.get_element_by_id(STYLE_ID).is_some() {
        return Ok(());
    }
    let style = doc.create_element("style")?;
    style.set_id(STYLE_ID);
    style.set_text_content(Some(CSS));
    match doc.head() {
        Some(head) => head.append_child(&style)?,
        None => match doc.document_element() {
            Some(root) => root.append_child(&style)?,
            None => return Ok(()),
        },
    };
    Ok(())
}
