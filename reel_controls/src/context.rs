// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! UI Context: the overlay state of one video.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use kurbo::{Rect, Size};
use reel_controls_core::config::OverlayConfig;
use reel_controls_core::format;
use reel_controls_core::icon::CosmeticSkin;
use reel_controls_core::layout::{self, LayoutMode, PopoverSide};
use reel_controls_core::locate::{LocateTier, Located};
use reel_controls_core::timestamp::TimestampSeeker;
use reel_controls_core::trace::{ContextId, ControlRole, LocateEvent};
use reel_controls_core::volume::MuteMachine;
use reel_controls_web::dom::{rect_of, set_px, swallow};
use reel_controls_web::{FrameTask, TimerSlot};
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Element, Event, HtmlElement, HtmlVideoElement, UiEvent};

use crate::audio;
use crate::overlay::{self, OverlayUi};
use crate::session::Session;

/// Overlay state of one attached video.
///
/// Timers and the layout frame are single-slot: scheduling replaces what
/// was pending. Every callback holds a weak reference and re-checks that
/// the video is still connected, so a context abandoned with work in flight
/// goes quiet.
///
/// The video handle is strong. Only the session's context table holds the
/// context strongly, and [`detach`](Self::detach) drops every listener, so
/// pruning the context releases the element.
pub(crate) struct UiContext {
    pub(crate) id: ContextId,
    pub(crate) video: HtmlVideoElement,
    pub(crate) host: HtmlElement,
    pub(crate) ui: OverlayUi,
    config: OverlayConfig,
    native: RefCell<Option<Located<Element>>>,
    left: RefCell<Option<Element>>,

    pub(crate) button_hover: Cell<bool>,
    pub(crate) popover_hover: Cell<bool>,
    pub(crate) seeking: Cell<bool>,
    popover_open: Cell<bool>,
    /// Set while we click the native button ourselves, so its listener lets
    /// the click through to the host.
    allow_native_click: Cell<bool>,
    mode: Cell<LayoutMode>,

    close_timer: TimerSlot,
    flash_timer: TimerSlot,
    icon_timer: TimerSlot,
    pub(crate) seek_timer: TimerSlot,
    layout_frame: FrameTask,

    pub(crate) mute: RefCell<MuteMachine>,
    pub(crate) seeker: RefCell<TimestampSeeker>,
    pub(crate) timestamp_pause_applied: Cell<bool>,
    skin: RefCell<CosmeticSkin>,
    listeners: RefCell<Vec<EventListener>>,
}

impl UiContext {
    /// Builds the overlay for `video`, appends it to `host`, and wires it.
    pub(crate) fn new(
        session: &Rc<Session>,
        id: ContextId,
        video: HtmlVideoElement,
        host: HtmlElement,
    ) -> Result<Rc<Self>, JsValue> {
        let ui = OverlayUi::build(&session.document, &video)?;
        host.append_child(&ui.root)?;

        let config = session.config;
        let weak_session = Rc::downgrade(session);
        let ctx = Rc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let layout_frame = FrameTask::new(move || {
                if let (Some(ctx), Some(session)) = (weak.upgrade(), weak_session.upgrade()) {
                    ctx.update_layout(&session);
                }
            });
            Self {
                id,
                video,
                host,
                ui,
                config,
                native: RefCell::new(None),
                left: RefCell::new(None),
                button_hover: Cell::new(false),
                popover_hover: Cell::new(false),
                seeking: Cell::new(false),
                popover_open: Cell::new(false),
                allow_native_click: Cell::new(false),
                mode: Cell::new(LayoutMode::default()),
                close_timer: TimerSlot::new(),
                flash_timer: TimerSlot::new(),
                icon_timer: TimerSlot::new(),
                seek_timer: TimerSlot::new(),
                layout_frame,
                mute: RefCell::new(MuteMachine::new()),
                seeker: RefCell::new(TimestampSeeker::new(config.seek)),
                timestamp_pause_applied: Cell::new(false),
                skin: RefCell::new(CosmeticSkin::new()),
                listeners: RefCell::new(Vec::new()),
            }
        });

        *ctx.listeners.borrow_mut() = overlay::wire(session, &ctx);
        ctx.refresh_buttons();
        ctx.refresh_time();
        Ok(ctx)
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.video.is_connected()
    }

    /// Removes the overlay and its listeners, and stops pending work.
    pub(crate) fn detach(&self) {
        self.listeners.borrow_mut().clear();
        self.layout_frame.cancel();
        self.close_timer.cancel();
        self.flash_timer.cancel();
        self.icon_timer.cancel();
        self.seek_timer.cancel();
        self.ui.root.remove();
    }

    /// The bound native volume button, if it is still in the document.
    pub(crate) fn native_button(&self) -> Option<Element> {
        self.native
            .borrow()
            .as_ref()
            .map(|located| located.node.clone())
            .filter(|button| button.is_connected())
    }

    pub(crate) fn native_available(&self) -> bool {
        self.native_button().is_some()
    }

    /// Records the native button. Returns `true` if it changed.
    pub(crate) fn set_native(&self, located: Located<Element>) -> bool {
        let mut native = self.native.borrow_mut();
        if native.as_ref().is_some_and(|current| current.node == located.node) {
            return false;
        }
        *native = Some(located);
        *self.skin.borrow_mut() = CosmeticSkin::new();
        true
    }

    /// Forgets `button` if it is the bound native button, after another
    /// context took it over.
    pub(crate) fn clear_native(&self, button: &Element) {
        let mut native = self.native.borrow_mut();
        if native.as_ref().is_some_and(|current| current.node == *button) {
            *native = None;
            drop(native);
            *self.skin.borrow_mut() = CosmeticSkin::new();
            self.close_popover();
            self.schedule_layout();
        }
    }

    pub(crate) fn schedule_layout(&self) {
        self.layout_frame.schedule();
    }

    /// Clicks the native button on our own behalf. Returns `false` if there
    /// is no clickable native button.
    pub(crate) fn trigger_native_toggle(&self) -> bool {
        let Some(button) = self.native_button() else {
            return false;
        };
        let Some(button) = button.dyn_ref::<HtmlElement>() else {
            return false;
        };
        self.allow_native_click.set(true);
        button.click();
        self.allow_native_click.set(false);
        true
    }

    /// Returns `true` (once) if the click being handled is our own.
    pub(crate) fn take_native_click_allowance(&self) -> bool {
        self.allow_native_click.replace(false)
    }

    /// Single click or Enter/Space on the volume control.
    ///
    /// Opens the popover if closed, otherwise toggles mute and keeps it
    /// open. Repeat clicks of a double click are left to the dblclick
    /// handler.
    pub(crate) fn handle_volume_click(self: &Rc<Self>, session: &Session, event: &Event) {
        swallow(event);
        if event.dyn_ref::<UiEvent>().is_some_and(|ui| ui.detail() > 1) {
            return;
        }
        if !self.popover_open.get() {
            self.open_popover();
            return;
        }
        audio::toggle(session, self);
        self.open_popover();
    }

    pub(crate) fn handle_volume_double_click(self: &Rc<Self>, session: &Session, event: &Event) {
        swallow(event);
        audio::toggle(session, self);
        self.open_popover();
    }

    pub(crate) fn is_popover_open(&self) -> bool {
        self.popover_open.get()
    }

    pub(crate) fn open_popover(&self) {
        self.close_timer.cancel();
        if !self.popover_open.replace(true) {
            let _ = self.ui.popover.class_list().add_1("rc-open");
        }
        self.schedule_layout();
    }

    pub(crate) fn close_popover(&self) {
        self.close_timer.cancel();
        self.popover_open.set(false);
        let _ = self.ui.popover.class_list().remove_1("rc-open");
    }

    /// Closes the popover after a short delay unless the pointer comes back
    /// over the button or the popover.
    pub(crate) fn schedule_close_popover(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.close_timer
            .schedule(self.config.timing.popover_close_ms, move || {
                let Some(ctx) = weak.upgrade() else {
                    return;
                };
                if ctx.button_hover.get() || ctx.popover_hover.get() {
                    return;
                }
                ctx.close_popover();
            });
    }

    /// Returns `true` if `target` is inside the popover or the native button.
    pub(crate) fn owns_pointer_target(&self, target: &Element) -> bool {
        self.ui.popover.contains(Some(target))
            || self
                .native_button()
                .is_some_and(|button| button.contains(Some(target)))
    }

    /// Shows the percentage readout briefly.
    pub(crate) fn flash_value(self: &Rc<Self>, volume: f64) {
        self.ui
            .volume_value
            .set_text_content(Some(&format::format_percent(volume)));
        let _ = self.ui.popover.class_list().add_1("rc-show-value");
        let weak = Rc::downgrade(self);
        self.flash_timer
            .schedule(self.config.timing.value_flash_ms, move || {
                if let Some(ctx) = weak.upgrade() {
                    let _ = ctx.ui.popover.class_list().remove_1("rc-show-value");
                }
            });
    }

    pub(crate) fn refresh_buttons(&self) {
        let muted = self.video.muted() || self.video.volume() <= 0.0;
        let _ = self
            .ui
            .root
            .class_list()
            .toggle_with_force("rc-muted", muted);
        let _ = self
            .ui
            .status
            .class_list()
            .toggle_with_force("rc-paused", self.video.paused());
    }

    pub(crate) fn refresh_time(&self) {
        let current = self.video.current_time();
        let duration = self.video.duration();
        self.ui
            .time_text
            .set_text_content(Some(&format::format_time(current, duration)));
        if !self.seeking.get() {
            let percent = format::progress_fraction(current, duration) * 100.0;
            self.ui.seek.set_value(&percent.to_string());
        }
    }

    /// Mirrors the element's volume into the slider and readout.
    pub(crate) fn mirror_volume(&self) {
        let volume = self.video.volume();
        self.ui
            .volume_slider
            .set_value(&(volume * 100.0).round().to_string());
        self.ui
            .volume_value
            .set_text_content(Some(&format::format_percent(volume)));
    }

    /// Re-skins a geometry-found native button after its state settles.
    pub(crate) fn schedule_icon_sync(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.icon_timer
            .schedule(self.config.timing.icon_resync_ms, move || {
                if let Some(ctx) = weak.upgrade()
                    && ctx.is_connected()
                {
                    ctx.sync_icon();
                }
            });
    }

    fn sync_icon(&self) {
        let native = self.native.borrow().clone();
        let Some(Located {
            node: button,
            tier: LocateTier::Geometric,
        }) = native
        else {
            return;
        };
        if !button.is_connected() {
            return;
        }
        let muted = self.video.muted() || self.video.volume() <= 0.0;
        let label = button.get_attribute("aria-label");
        let markup = button.inner_html();
        let patch = self
            .skin
            .borrow_mut()
            .sync(muted, label.as_deref(), &markup);
        if let Some(label) = patch.label {
            let _ = button.set_attribute("aria-label", &label);
        }
        if let Some(markup) = patch.markup {
            button.set_inner_html(&markup);
        }
    }

    /// Recomputes overlay box, button bindings, progress insets and popover
    /// placement. Runs at most once per animation frame.
    fn update_layout(&self, session: &Rc<Session>) {
        if !self.is_connected() {
            return;
        }
        let host_rect = rect_of(&self.host);
        if host_rect.width() <= 0.0 || host_rect.height() <= 0.0 {
            return;
        }
        let video_abs = rect_of(&self.video);
        let video_rect = layout::relative_to(video_abs, host_rect);
        let root = &self.ui.root;
        set_px(root, "left", video_rect.x0);
        set_px(root, "top", video_rect.y0);
        set_px(root, "width", video_rect.width());
        set_px(root, "height", video_rect.height());

        let path = reel_controls_web::current_path().unwrap_or_default();
        let mode = LayoutMode::detect(&path, video_rect.width(), &self.config.layout);
        self.mode.set(mode);
        let classes = root.class_list();
        let _ = classes.toggle_with_force("rc-reels", mode.reels);
        let _ = classes.toggle_with_force("rc-feed", mode.feed);
        let _ = classes.toggle_with_force("rc-compact", mode.compact);

        let locator = session.locator();
        if !self.native_available()
            && let Some(found) = locator.native_volume_button(&self.video)
        {
            session.bind_native_button(self, found);
        }
        let left = locator.left_ui_button(&self.video);
        let left_changed = *self.left.borrow() != left.as_ref().map(|l| l.node.clone());
        if left_changed {
            if let Some(found) = &left {
                session.trace(|t| {
                    t.locate(&LocateEvent {
                        context: self.id,
                        role: ControlRole::LeftUi,
                        tier: found.tier,
                    });
                });
            }
            *self.left.borrow_mut() = left.as_ref().map(|l| l.node.clone());
        }

        let right_rect = self
            .native_button()
            .map(|button| layout::relative_to(rect_of(&button), video_abs));
        let left_rect = left.map(|l| layout::relative_to(rect_of(&l.node), video_abs));
        let insets = layout::progress_insets(
            video_rect.width(),
            left_rect,
            right_rect,
            mode,
            &self.config.layout,
        );
        let style = root.style();
        let _ = style.set_property("--rc-progress-left", &format!("{}px", insets.left));
        let _ = style.set_property("--rc-progress-right", &format!("{}px", insets.right));

        if self.popover_open.get() {
            self.position_popover(video_abs, mode);
        }
    }

    fn position_popover(&self, video_abs: Rect, mode: LayoutMode) {
        let Some(button) = self.native_button() else {
            return;
        };
        let anchor = layout::relative_to(rect_of(&button), video_abs);
        let popover = &self.ui.popover;
        let size = Size::new(
            f64::from(popover.offset_width()),
            f64::from(popover.offset_height()),
        );
        let placement =
            layout::place_popover(video_abs.size(), anchor, size, mode, &self.config.layout);
        set_px(popover, "left", placement.origin.x);
        set_px(popover, "top", placement.origin.y);
        let side = match placement.side {
            PopoverSide::Above => "above",
            PopoverSide::Right => "right",
            PopoverSide::Left => "left",
            PopoverSide::Below => "below",
        };
        let _ = popover.set_attribute("data-side", side);
    }
}

impl std::fmt::Debug for UiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiContext")
            .field("id", &self.id)
            .field("popover_open", &self.popover_open.get())
            .field("seeking", &self.seeking.get())
            .field("mode", &self.mode.get())
            .field("mute", &self.mute.borrow())
            .field("seeker", &self.seeker.borrow().phase())
            .finish_non_exhaustive()
    }
}
