// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser glue for reel controls.
//!
//! This crate adapts browser APIs to the contracts in `reel_controls_core`:
//!
//! - [`FrameTask`]: `requestAnimationFrame` callback, coalesced per frame
//! - [`TimerSlot`]: at most one pending timeout
//! - [`PageTree`]: the live document as a `ControlTree`
//! - [`BrowserStore`]: Web Storage as a `KeyValueStore`
//! - [`copy_text`]: clipboard write with a selection fallback
//! - [`ConsoleSink`]: diagnostics to the developer console

#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "most of this crate only runs in the browser")
)]

mod clipboard;
mod console;
pub mod dom;
mod raf;
mod storage;
mod timer;

pub use clipboard::copy_text;
pub use console::ConsoleSink;
pub use dom::PageTree;
pub use raf::FrameTask;
pub use storage::{BrowserStore, StorageArea};
pub use timer::TimerSlot;

use js_sys::Reflect;
use reel_controls_core::volume::UserActivation;
use wasm_bindgen::JsValue;

/// Milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Reads `navigator.userActivation`.
///
/// Engines without the API report no activation, so an unmute waits for
/// the next gesture rather than being refused by autoplay policy.
#[must_use]
pub fn user_activation() -> UserActivation {
    let Some(window) = web_sys::window() else {
        return UserActivation::default();
    };
    let Ok(state) = Reflect::get(&window.navigator(), &JsValue::from_str("userActivation")) else {
        return UserActivation::default();
    };
    if state.is_undefined() || state.is_null() {
        return UserActivation::default();
    }
    let flag = |name: &str| {
        Reflect::get(&state, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    };
    UserActivation {
        is_active: flag("isActive"),
        has_been_active: flag("hasBeenActive"),
    }
}

/// The page's current URL, if readable.
#[must_use]
pub fn current_url() -> Option<String> {
    web_sys::window()?.location().href().ok()
}

/// The page's current path, if readable.
#[must_use]
pub fn current_path() -> Option<String> {
    web_sys::window()?.location().pathname().ok()
}

/// `document.referrer`, if non-empty.
#[must_use]
pub fn referrer() -> Option<String> {
    let referrer = web_sys::window()?.document()?.referrer();
    (!referrer.is_empty()).then_some(referrer)
}
