// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-slot timers.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

/// Holds at most one pending timeout.
///
/// Scheduling replaces (and thereby cancels) whatever was pending. Clones
/// share the slot.
#[derive(Clone, Default)]
pub struct TimerSlot {
    pending: Rc<RefCell<Option<Timeout>>>,
}

impl TimerSlot {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `callback` after `delay_ms`, cancelling any pending timeout.
    pub fn schedule(&self, delay_ms: u32, callback: impl FnOnce() + 'static) {
        self.cancel();
        let slot = Rc::downgrade(&self.pending);
        let timeout = Timeout::new(delay_ms, move || {
            // Release the slot before running so the callback can reschedule.
            if let Some(slot) = slot.upgrade() {
                let fired = slot.borrow_mut().take();
                drop(fired);
            }
            callback();
        });
        *self.pending.borrow_mut() = Some(timeout);
    }

    /// Cancels the pending timeout, if any.
    pub fn cancel(&self) {
        // Dropping a `Timeout` clears it.
        let cancelled = self.pending.borrow_mut().take();
        drop(cancelled);
    }

    /// Returns `true` while a timeout is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

impl std::fmt::Debug for TimerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerSlot")
            .field("pending", &self.is_pending())
            .finish()
    }
}
