// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` coalescing.
//!
//! [`FrameTask`] runs a callback on the next animation frame, at most once
//! per frame no matter how many times it is [`schedule`](FrameTask::schedule)d
//! in between. The pending flag is a [`FrameGate`] and is cleared when the
//! callback starts, so the callback may schedule the next frame itself.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use reel_controls_core::layout::FrameGate;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

// Direct global bindings instead of `web_sys::Window` methods, so scheduling
// never has to fetch the window.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type FrameClosure = Closure<dyn FnMut(f64)>;

/// A callback coalesced to one run per animation frame.
pub struct FrameTask {
    inner: Rc<FrameInner>,
}

struct FrameInner {
    gate: FrameGate,

    /// The JS closure registered with `requestAnimationFrame`. Holds only a
    /// weak reference back to this struct.
    closure: RefCell<Option<FrameClosure>>,

    callback: RefCell<Box<dyn FnMut()>>,

    /// The ID returned by the most recent `requestAnimationFrame` call.
    raf_id: Cell<i32>,
}

impl FrameTask {
    /// Creates an idle task running `callback`.
    pub fn new(callback: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(FrameInner {
            gate: FrameGate::new(),
            closure: RefCell::new(None),
            callback: RefCell::new(Box::new(callback)),
            raf_id: Cell::new(0),
        });

        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |_timestamp_ms: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.gate.open();
            // A callback that re-enters its own task through a nested frame
            // is dropped rather than aliased.
            if let Ok(mut callback) = inner.callback.try_borrow_mut() {
                callback();
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Requests a run on the next animation frame.
    ///
    /// Returns `true` if a frame was requested, `false` if one was already
    /// pending.
    pub fn schedule(&self) -> bool {
        if !self.inner.gate.request() {
            return false;
        }
        if let Some(closure) = self.inner.closure.borrow().as_ref() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.raf_id.set(id);
        }
        true
    }

    /// Cancels the pending run, if any.
    pub fn cancel(&self) {
        if self.inner.gate.is_queued() {
            cancel_animation_frame(self.inner.raf_id.get());
            self.inner.gate.open();
        }
    }

    /// Returns `true` if a run is pending.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.inner.gate.is_queued()
    }
}

impl Drop for FrameTask {
    fn drop(&mut self) {
        self.cancel();
        self.inner.closure.borrow_mut().take();
    }
}

impl std::fmt::Debug for FrameTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTask")
            .field("queued", &self.inner.gate.is_queued())
            .field("raf_id", &self.inner.raf_id.get())
            .finish_non_exhaustive()
    }
}
