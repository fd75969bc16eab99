// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay Builder: the DOM surface of one UI Context and its wiring.

use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use reel_controls_web::dom::{OVERLAY_CLASS, element, element_with_class, listener, stop};
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, HtmlElement, HtmlInputElement, HtmlVideoElement};

use crate::context::UiContext;
use crate::session::{Session, is_touch};
use crate::{audio, deeplink};

const PLAY_ICON: &str = r#"<svg class="rc-icon-play" viewBox="0 0 24 24" aria-hidden="true"><path d="M8 5v14l11-7z"/></svg>"#;
const PAUSE_ICON: &str = r#"<svg class="rc-icon-pause" viewBox="0 0 24 24" aria-hidden="true"><path d="M6 5h4v14H6zM14 5h4v14h-4z"/></svg>"#;

/// Events that never leave the overlay.
///
/// `contextmenu` is safe to stop here: the share menu listens on the
/// document in the capture phase and sees it first.
const CONTAINED_EVENTS: &[&str] = &[
    "click",
    "dblclick",
    "pointerdown",
    "pointerup",
    "pointermove",
    "mousedown",
    "mouseup",
    "touchstart",
    "touchend",
    "wheel",
    "contextmenu",
    "keydown",
    "keyup",
];

/// Elements of one overlay.
#[derive(Debug)]
pub(crate) struct OverlayUi {
    pub(crate) root: HtmlElement,
    pub(crate) popover: HtmlElement,
    pub(crate) volume_slider: HtmlInputElement,
    pub(crate) volume_value: HtmlElement,
    pub(crate) status: HtmlElement,
    pub(crate) time_text: HtmlElement,
    pub(crate) seek: HtmlInputElement,
}

impl OverlayUi {
    /// Builds the detached subtree for `video`.
    pub(crate) fn build(doc: &Document, video: &HtmlVideoElement) -> Result<Self, JsValue> {
        let root = element_with_class(doc, "div", OVERLAY_CLASS)?;

        let popover = element_with_class(doc, "div", "rc-volume-popover")?;
        let volume_slider = range(doc, "rc-volume-slider", "Volume")?;
        volume_slider.set_value(&(video.volume() * 100.0).round().to_string());
        let volume_value = element_with_class(doc, "span", "rc-volume-value")?;
        popover.append_child(&volume_slider)?;
        popover.append_child(&volume_value)?;

        let progress = element_with_class(doc, "div", "rc-progress")?;
        let status = element_with_class(doc, "button", "rc-status")?;
        status.set_attribute("type", "button")?;
        status.set_attribute("aria-label", "Play or pause")?;
        status.set_inner_html(&format!("{PLAY_ICON}{PAUSE_ICON}"));
        let time_text = element_with_class(doc, "span", "rc-time")?;
        let seek = range(doc, "rc-seek", "Seek")?;
        seek.set_value("0");
        progress.append_child(&status)?;
        progress.append_child(&time_text)?;
        progress.append_child(&seek)?;

        root.append_child(&popover)?;
        root.append_child(&progress)?;

        Ok(Self {
            root,
            popover,
            volume_slider,
            volume_value,
            status,
            time_text,
            seek,
        })
    }
}

fn range(doc: &Document, class: &str, label: &str) -> Result<HtmlInputElement, JsValue> {
    let input: HtmlInputElement = element(doc, "input")?.unchecked_into();
    input.set_type("range");
    input.set_min("0");
    input.set_max("100");
    input.set_step("1");
    input.set_class_name(class);
    input.set_attribute("aria-label", label)?;
    Ok(input)
}

/// Creates the listeners of one context. The context owns the returned
/// handles; dropping them on detach removes every listener.
///
/// Handlers hold the context and the session weakly.
pub(crate) fn wire(session: &Rc<Session>, ctx: &Rc<UiContext>) -> Vec<EventListener> {
    let mut out = Vec::new();
    wire_containment(&ctx.ui.root, &mut out);
    wire_popover(ctx, &mut out);
    wire_volume(session, ctx, &mut out);
    wire_progress(ctx, &mut out);
    wire_media(session, ctx, &mut out);

    let weak = Rc::downgrade(ctx);
    out.push(listener(&ctx.host, "pointerenter", false, move |_| {
        with(&weak, |ctx| ctx.schedule_layout());
    }));
    out
}

fn with(weak: &Weak<UiContext>, f: impl FnOnce(&Rc<UiContext>)) {
    if let Some(ctx) = weak.upgrade()
        && ctx.is_connected()
    {
        f(&ctx);
    }
}

/// Keeps pointer, touch, wheel and keyboard events inside the overlay so
/// host handlers (navigate-on-click feed cards, play/pause on tap) never
/// see them. Only propagation stops, so these listeners stay passive and
/// scrolling is untouched.
fn wire_containment(root: &HtmlElement, out: &mut Vec<EventListener>) {
    for &name in CONTAINED_EVENTS {
        out.push(EventListener::new(root, name, |event| stop(event)));
    }
}

fn wire_popover(ctx: &Rc<UiContext>, out: &mut Vec<EventListener>) {
    let popover = &ctx.ui.popover;

    let weak = Rc::downgrade(ctx);
    out.push(listener(popover, "pointerenter", false, move |event| {
        if is_touch(event) {
            return;
        }
        with(&weak, |ctx| {
            ctx.popover_hover.set(true);
            ctx.open_popover();
        });
    }));

    let weak = Rc::downgrade(ctx);
    out.push(listener(popover, "pointerleave", false, move |event| {
        if is_touch(event) {
            return;
        }
        with(&weak, |ctx| {
            ctx.popover_hover.set(false);
            ctx.schedule_close_popover();
        });
    }));
}

fn wire_volume(session: &Rc<Session>, ctx: &Rc<UiContext>, out: &mut Vec<EventListener>) {
    let weak = Rc::downgrade(ctx);
    let owner = Rc::downgrade(session);
    out.push(listener(&ctx.ui.volume_slider, "input", false, move |_| {
        let Some(session) = owner.upgrade() else {
            return;
        };
        with(&weak, |ctx| {
            let Ok(percent) = ctx.ui.volume_slider.value().parse::<f64>() else {
                return;
            };
            let value = (percent / 100.0).clamp(0.0, 1.0);
            audio::slide(&session, ctx, value);
            ctx.flash_value(value);
        });
    }));
}

fn wire_progress(ctx: &Rc<UiContext>, out: &mut Vec<EventListener>) {
    let seek = &ctx.ui.seek;

    let weak = Rc::downgrade(ctx);
    out.push(listener(seek, "pointerdown", false, move |_| {
        with(&weak, |ctx| ctx.seeking.set(true));
    }));
    for name in ["pointerup", "pointercancel"] {
        let weak = Rc::downgrade(ctx);
        out.push(listener(seek, name, false, move |_| {
            with(&weak, |ctx| ctx.seeking.set(false));
        }));
    }

    let weak = Rc::downgrade(ctx);
    out.push(listener(seek, "input", false, move |_| {
        with(&weak, |ctx| {
            let duration = ctx.video.duration();
            if !(duration.is_finite() && duration > 0.0) {
                return;
            }
            let Ok(percent) = ctx.ui.seek.value().parse::<f64>() else {
                return;
            };
            ctx.video
                .set_current_time((percent / 100.0).clamp(0.0, 1.0) * duration);
            ctx.refresh_time();
        });
    }));

    let weak = Rc::downgrade(ctx);
    out.push(listener(&ctx.ui.status, "click", false, move |_| {
        with(&weak, |ctx| {
            if ctx.video.paused() {
                let _ = ctx.video.play();
            } else {
                let _ = ctx.video.pause();
            }
        });
    }));
}

fn wire_media(session: &Rc<Session>, ctx: &Rc<UiContext>, out: &mut Vec<EventListener>) {
    let video = &ctx.video;

    for name in ["play", "pause"] {
        let weak = Rc::downgrade(ctx);
        out.push(listener(video, name, false, move |_| {
            with(&weak, |ctx| ctx.refresh_buttons());
        }));
    }

    let weak = Rc::downgrade(ctx);
    let owner = Rc::downgrade(session);
    out.push(listener(video, "volumechange", false, move |_| {
        let Some(session) = owner.upgrade() else {
            return;
        };
        with(&weak, |ctx| {
            ctx.mirror_volume();
            ctx.refresh_buttons();
            if !ctx.video.muted() {
                session.trace(|t| session.preferences.save_volume(ctx.video.volume(), t));
            }
            ctx.schedule_icon_sync();
        });
    }));

    let weak = Rc::downgrade(ctx);
    out.push(listener(video, "timeupdate", false, move |_| {
        with(&weak, |ctx| ctx.refresh_time());
    }));

    for name in ["durationchange", "loadedmetadata"] {
        let weak = Rc::downgrade(ctx);
        let owner = Rc::downgrade(session);
        out.push(listener(video, name, false, move |_| {
            let Some(session) = owner.upgrade() else {
                return;
            };
            with(&weak, |ctx| {
                ctx.refresh_time();
                deeplink::maybe_arm(&session, ctx);
            });
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_wheel_and_menu_events_are_contained() {
        for name in ["touchstart", "touchend", "pointermove", "wheel", "contextmenu"] {
            assert!(CONTAINED_EVENTS.contains(&name), "{name} must not reach the host");
        }
        let mut sorted = CONTAINED_EVENTS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), CONTAINED_EVENTS.len(), "no event is wired twice");
    }
}
