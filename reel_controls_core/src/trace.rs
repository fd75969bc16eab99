// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for the overlay lifecycle.
//!
//! This module provides a [`TraceSink`] trait with one method per event
//! kind. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`; call sites go through
//! it and never check whether diagnostics are enabled.

use crate::locate::LocateTier;
use crate::storage::StoreError;
use crate::timestamp::SeekStep;
use crate::volume::AudioCommand;

/// Identifies a UI Context in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

/// Which native control a locate event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlRole {
    /// The volume/mute button.
    Volume,
    /// The left-side auxiliary button.
    LeftUi,
}

/// Emitted when a UI Context is created for a video.
#[derive(Clone, Copy, Debug)]
pub struct AttachEvent {
    /// The new context.
    pub context: ContextId,
    /// Whether a native volume control was found at attach time.
    pub native_found: bool,
}

/// Emitted when a native control is (re)bound to a context.
#[derive(Clone, Copy, Debug)]
pub struct LocateEvent {
    /// The owning context.
    pub context: ContextId,
    /// Which control.
    pub role: ControlRole,
    /// Which tier found it.
    pub tier: LocateTier,
}

/// Emitted for each step of the timestamp seek state machine.
#[derive(Clone, Copy, Debug)]
pub struct SeekEvent {
    /// The owning context.
    pub context: ContextId,
    /// Attempts made so far for the current URL.
    pub attempt: u8,
    /// What the machine decided.
    pub step: SeekStep,
}

/// Whether an unmute was deferred or has now been applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnmutePhase {
    /// Waiting for a user gesture.
    Deferred,
    /// Applied on a user gesture.
    Applied,
}

/// Receives diagnostics events.
pub trait TraceSink {
    /// A context was attached.
    fn on_attach(&mut self, _event: &AttachEvent) {}

    /// A native control was located.
    fn on_locate(&mut self, _event: &LocateEvent) {}

    /// A storage read or write failed and was degraded.
    fn on_storage_failure(&mut self, _error: &StoreError) {}

    /// The seek state machine advanced.
    fn on_seek(&mut self, _event: &SeekEvent) {}

    /// An audio command was issued.
    fn on_audio(&mut self, _context: ContextId, _command: &AudioCommand) {}

    /// An unmute was deferred behind, or released by, a user gesture.
    fn on_unmute_gate(&mut self, _context: ContextId, _phase: UnmutePhase) {}

    /// A share link was copied (or copying failed).
    fn on_share(&mut self, _copied: bool) {}
}

/// Dispatches to an optional [`TraceSink`].
pub struct Tracer<'a> {
    sink: Option<&'a mut dyn TraceSink>,
}

impl std::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}

impl<'a> Tracer<'a> {
    /// A tracer forwarding to `sink`.
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        Self { sink: Some(sink) }
    }

    /// A tracer that drops every event.
    #[must_use]
    pub fn none() -> Self {
        Self { sink: None }
    }

    /// A tracer forwarding to `sink` if present.
    pub fn from_option(sink: Option<&'a mut dyn TraceSink>) -> Self {
        Self { sink }
    }

    /// Forwards [`TraceSink::on_attach`].
    pub fn attach(&mut self, event: &AttachEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_attach(event);
        }
    }

    /// Forwards [`TraceSink::on_locate`].
    pub fn locate(&mut self, event: &LocateEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_locate(event);
        }
    }

    /// Forwards [`TraceSink::on_storage_failure`].
    pub fn storage_failure(&mut self, error: &StoreError) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_storage_failure(error);
        }
    }

    /// Forwards [`TraceSink::on_seek`].
    pub fn seek(&mut self, event: &SeekEvent) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_seek(event);
        }
    }

    /// Forwards [`TraceSink::on_audio`].
    pub fn audio(&mut self, context: ContextId, command: &AudioCommand) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_audio(context, command);
        }
    }

    /// Forwards [`TraceSink::on_unmute_gate`].
    pub fn unmute_gate(&mut self, context: ContextId, phase: UnmutePhase) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_unmute_gate(context, phase);
        }
    }

    /// Forwards [`TraceSink::on_share`].
    pub fn share(&mut self, copied: bool) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.on_share(copied);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Counts events by kind.
    #[derive(Debug, Default)]
    pub(crate) struct CountingSink {
        pub(crate) storage_failures: usize,
        pub(crate) seeks: usize,
        pub(crate) gate_events: usize,
    }

    impl TraceSink for CountingSink {
        fn on_storage_failure(&mut self, _error: &StoreError) {
            self.storage_failures += 1;
        }

        fn on_seek(&mut self, _event: &SeekEvent) {
            self.seeks += 1;
        }

        fn on_unmute_gate(&mut self, _context: ContextId, _phase: UnmutePhase) {
            self.gate_events += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::CountingSink;
    use super::*;

    #[test]
    fn disabled_tracer_drops_events() {
        let mut tracer = Tracer::none();
        tracer.storage_failure(&StoreError::Unavailable("off".into()));
        tracer.share(true);
    }

    #[test]
    fn enabled_tracer_forwards() {
        let mut sink = CountingSink::default();
        {
            let mut tracer = Tracer::new(&mut sink);
            tracer.storage_failure(&StoreError::Unavailable("off".into()));
            tracer.unmute_gate(ContextId(1), UnmutePhase::Deferred);
        }
        assert_eq!(sink.storage_failures, 1);
        assert_eq!(sink.gate_events, 1);
    }
}
