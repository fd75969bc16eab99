// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applies [`MuteMachine`] decisions to a video element.
//!
//! The machine decides; this module only writes `volume`, clicks the native
//! button (or writes `muted` when there is none), persists the result and
//! records what happened.

use reel_controls_core::trace::UnmutePhase;
use reel_controls_core::volume::{AudioCommand, Gesture, MediaAudio, MuteMachine, Toggle};
use reel_controls_web::dom::{swallow, target_element};
use reel_controls_web::user_activation;
use web_sys::Event;

use crate::context::UiContext;
use crate::session::Session;

fn media(ctx: &UiContext) -> MediaAudio {
    MediaAudio {
        muted: ctx.video.muted(),
        volume: ctx.video.volume(),
    }
}

fn stored_volume(session: &Session) -> Option<f64> {
    session.trace(|t| session.preferences.load(t)).volume
}

/// Executes `command` against the context's video.
///
/// A native toggle whose button vanished since the command was planned
/// falls back to writing `muted` directly.
fn apply(session: &Session, ctx: &UiContext, command: &AudioCommand, persist: bool) {
    if let Some(volume) = command.volume {
        ctx.video.set_volume(volume);
    }
    match command.toggle {
        Some(Toggle::Native) => {
            if !ctx.trigger_native_toggle() {
                ctx.video.set_muted(command.expected.muted);
            }
        }
        Some(Toggle::Direct { muted }) => ctx.video.set_muted(muted),
        None => {}
    }
    session.trace(|t| {
        t.audio(ctx.id, command);
        if persist {
            session
                .preferences
                .save(command.expected.volume, command.expected.muted, t);
        }
    });
    ctx.mirror_volume();
    ctx.refresh_buttons();
}

/// Mute toggle from the volume control.
pub(crate) fn toggle(session: &Session, ctx: &UiContext) {
    let command = MuteMachine::toggle(media(ctx), ctx.native_available());
    apply(session, ctx, &command, true);
}

/// Volume slider moved to `value`.
pub(crate) fn slide(session: &Session, ctx: &UiContext, value: f64) {
    let command = MuteMachine::slide(media(ctx), value, ctx.native_available());
    apply(session, ctx, &command, true);
}

/// Reconciles a new context with the stored preference.
///
/// Nothing is persisted here: the element's autoplay state is not a user
/// choice.
pub(crate) fn attach(session: &Session, ctx: &UiContext) {
    let preference = session.trace(|t| session.preferences.load(t));
    let plan = ctx.mute.borrow_mut().attach(
        preference,
        media(ctx),
        user_activation(),
        ctx.native_available(),
    );
    if let Some(command) = plan.command {
        apply(session, ctx, &command, false);
    }
    if plan.deferred {
        session.trace(|t| t.unmute_gate(ctx.id, UnmutePhase::Deferred));
    }
}

/// Offers a document click or keydown to the primary context's gate.
///
/// A released gesture is swallowed so the host does not also treat it as,
/// say, a play/pause tap. Playback held for a timestamp seek stays held
/// until [`after_seek`].
pub(crate) fn gesture(session: &Session, event: &Event) {
    let Some(ctx) = session.primary_context() else {
        return;
    };
    let inside_primary_host = target_element(event)
        .is_some_and(|target| ctx.host.contains(Some(&target)));
    let gesture = Gesture {
        trusted: event.is_trusted(),
        inside_primary_host,
    };
    if !ctx.mute.borrow().pending_unmute() {
        return;
    }
    let stored = stored_volume(session);
    let plan = ctx
        .mute
        .borrow_mut()
        .gesture(gesture, media(&ctx), stored, ctx.native_available());
    let Some(plan) = plan else {
        return;
    };
    swallow(event);
    if let Some(command) = plan.command {
        apply(session, &ctx, &command, true);
        session.trace(|t| t.unmute_gate(ctx.id, UnmutePhase::Applied));
    }
}

/// Releases whatever was held behind a timestamp seek.
pub(crate) fn after_seek(session: &Session, ctx: &UiContext) {
    let stored = stored_volume(session);
    let plan = ctx.mute.borrow_mut().after_seek(
        user_activation(),
        media(ctx),
        stored,
        ctx.native_available(),
    );
    if let Some(command) = plan.command {
        apply(session, ctx, &command, true);
        session.trace(|t| t.unmute_gate(ctx.id, UnmutePhase::Applied));
    }
    if plan.play {
        let _ = ctx.video.play();
    }
}
