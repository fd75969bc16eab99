// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drives [`TimestampSeeker`](reel_controls_core::timestamp::TimestampSeeker)
//! for each context: captures targets from the URL, arms the primary video,
//! and runs the retry timer.

use std::rc::Rc;

use reel_controls_core::layout::is_reels_path;
use reel_controls_core::timestamp::{self, Playhead, SeekStep};
use reel_controls_core::trace::SeekEvent;
use reel_controls_web::{current_path, current_url, now_ms};
use web_sys::{HtmlAnchorElement, Url};

use crate::audio;
use crate::context::UiContext;
use crate::session::Session;

/// Stores a navigation intent for the current path if the URL (or, on the
/// first visit, the referrer) carries a timestamp.
pub(crate) fn capture(session: &Session, include_referrer: bool) {
    let (Some(url), Some(path)) = (current_url(), current_path()) else {
        return;
    };
    let referrer = include_referrer
        .then(reel_controls_web::referrer)
        .flatten();
    let Some(seconds) = timestamp::capture_target(&url, referrer.as_deref()) else {
        return;
    };
    session.trace(|t| session.intents.put(&path, seconds, now_ms(), t));
}

/// Records the target of an anchor about to navigate, so the timestamp
/// survives a client-side route that drops the query.
pub(crate) fn remember_anchor(session: &Session, anchor: &HtmlAnchorElement) {
    let href = anchor.href();
    let Some(seconds) = timestamp::timestamp_from_url(&href) else {
        return;
    };
    let Ok(parsed) = Url::new(&href) else {
        return;
    };
    let path = parsed.pathname();
    session.trace(|t| session.intents.put(&path, seconds, now_ms(), t));
}

/// Arms `ctx` if there is a pending timestamp and it is the primary video.
pub(crate) fn maybe_arm(session: &Rc<Session>, ctx: &Rc<UiContext>) {
    let (Some(url), Some(path)) = (current_url(), current_path()) else {
        return;
    };
    let target = timestamp::timestamp_from_url(&url).or_else(|| {
        session
            .trace(|t| session.intents.fresh(&path, now_ms(), t))
            .map(|intent| intent.seconds)
    });
    let Some(target) = target else {
        return;
    };
    if session.applied.borrow().is_applied(&url, &ctx.id) {
        return;
    }
    {
        let seeker = ctx.seeker.borrow();
        if seeker.is_active() && seeker.url() == Some(url.as_str()) {
            return;
        }
    }
    if !session.is_primary(ctx) {
        return;
    }

    if is_reels_path(&path) && !ctx.timestamp_pause_applied.replace(true) {
        let _ = ctx.video.pause();
        ctx.mute.borrow_mut().hold_for_seek();
    }

    let step = ctx.seeker.borrow_mut().arm(&url, &path, target);
    run(session, ctx, step);
}

fn fire(session: &Rc<Session>, ctx: &Rc<UiContext>) {
    let playhead = Playhead {
        current_time: ctx.video.current_time(),
        duration: ctx.video.duration(),
    };
    let step = ctx.seeker.borrow_mut().fire(playhead);
    run(session, ctx, step);
}

/// Carries out one seek step.
fn run(session: &Rc<Session>, ctx: &Rc<UiContext>, step: SeekStep) {
    let attempt = ctx.seeker.borrow().attempts();
    session.trace(|t| {
        t.seek(&SeekEvent {
            context: ctx.id,
            attempt,
            step,
        });
    });

    match step {
        SeekStep::Wait { delay_ms } => schedule(session, ctx, delay_ms),
        SeekStep::Seek { to, delay_ms } => {
            if let Some(position) = to {
                ctx.video.set_current_time(position);
            }
            schedule(session, ctx, delay_ms);
        }
        SeekStep::Satisfied => {
            ctx.seek_timer.cancel();
            let url = ctx.seeker.borrow().url().map(str::to_owned);
            if let Some(url) = url {
                session.applied.borrow_mut().mark(&url, ctx.id);
            }
            finish(session, ctx);
        }
        SeekStep::Abandoned => {
            ctx.seek_timer.cancel();
            finish(session, ctx);
        }
        SeekStep::Idle => {}
    }
}

/// Clears the intent of the page the seek was armed on, which is not
/// necessarily the current one.
fn finish(session: &Session, ctx: &UiContext) {
    let path = ctx.seeker.borrow().path().map(str::to_owned);
    if let Some(path) = path {
        session.trace(|t| session.intents.clear(&path, t));
    }
    audio::after_seek(session, ctx);
}

/// Replaces the context's retry timer. The callback no-ops once the video
/// is gone or the session dropped the context.
fn schedule(session: &Rc<Session>, ctx: &Rc<UiContext>, delay_ms: u32) {
    let weak_session = Rc::downgrade(session);
    let weak_ctx = Rc::downgrade(ctx);
    ctx.seek_timer.schedule(delay_ms, move || {
        let (Some(session), Some(ctx)) = (weak_session.upgrade(), weak_ctx.upgrade()) else {
            return;
        };
        if !ctx.is_connected() {
            ctx.seeker.borrow_mut().cancel();
            return;
        }
        fire(&session, &ctx);
    });
}
