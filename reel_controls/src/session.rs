// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The browser overlay session.
//!
//! One [`Session`] exists per page. It owns every UI Context, the
//! [`ContextRegistry`] mapping host elements to contexts, both stores, the
//! trace sink, and the page-wide state (last seen URL, last satisfied
//! timestamp, share menu). It is created at startup and never torn down.
//!
//! Contexts live in a table keyed by id and are pruned once their video
//! leaves the document. Pruning releases the context's registry entries,
//! which drops the listeners of the native buttons it owned.

use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use gloo_events::EventListener;
use kurbo::{Point, Rect};
use reel_controls_core::config::OverlayConfig;
use reel_controls_core::geometry;
use reel_controls_core::locate::{ControlTree as _, Located, Locator};
use reel_controls_core::registry::{Claim, ContextRegistry};
use reel_controls_core::storage::{IntentStore, PreferenceStore};
use reel_controls_core::timestamp::AppliedMarker;
use reel_controls_core::trace::{
    AttachEvent, ContextId, ControlRole, LocateEvent, TraceSink, Tracer,
};
use reel_controls_web::dom::{self, listener, rect_of};
use reel_controls_web::{BrowserStore, ConsoleSink, FrameTask, PageTree};
use wasm_bindgen::JsCast as _;
use web_sys::{Document, Element, Event, HtmlElement, HtmlVideoElement, KeyboardEvent, Window};

use crate::context::UiContext;
use crate::share::ShareMenu;
use crate::{audio, deeplink};

/// Marks a native button whose listeners are installed.
pub(crate) const BOUND_ATTR: &str = "data-rc-bound";

/// Marks a host whose positioning was checked.
const HOST_ATTR: &str = "data-rc-host";

pub(crate) struct Session {
    pub(crate) window: Window,
    pub(crate) document: Document,
    pub(crate) tree: PageTree,
    pub(crate) config: OverlayConfig,
    pub(crate) preferences: PreferenceStore<BrowserStore>,
    pub(crate) intents: IntentStore<BrowserStore>,
    /// Last satisfied (URL, context) timestamp.
    pub(crate) applied: RefCell<AppliedMarker<ContextId>>,
    pub(crate) menu: OnceCell<ShareMenu>,
    contexts: RefCell<BTreeMap<ContextId, Rc<UiContext>>>,
    registry: RefCell<ContextRegistry<Element, Vec<EventListener>>>,
    sink: RefCell<Option<ConsoleSink>>,
    scan_frame: OnceCell<FrameTask>,
    last_url: RefCell<Option<String>>,
}

impl Session {
    pub(crate) fn new(window: Window, document: Document, config: OverlayConfig) -> Rc<Self> {
        let preferences = PreferenceStore::new(BrowserStore::local());
        let sink = preferences.debug_enabled().then_some(ConsoleSink);
        let session = Rc::new(Self {
            tree: PageTree::new(document.clone()),
            window,
            document,
            config,
            preferences,
            intents: IntentStore::new(BrowserStore::session(), config.seek.intent_ttl_ms),
            applied: RefCell::new(AppliedMarker::new()),
            menu: OnceCell::new(),
            contexts: RefCell::new(BTreeMap::new()),
            registry: RefCell::new(ContextRegistry::new()),
            sink: RefCell::new(sink),
            scan_frame: OnceCell::new(),
            last_url: RefCell::new(None),
        });

        let weak = Rc::downgrade(&session);
        let _ = session.scan_frame.set(FrameTask::new(move || {
            if let Some(session) = weak.upgrade() {
                session.scan();
            }
        }));
        session
    }

    /// Runs `f` with a tracer over the console sink, if diagnostics are on.
    pub(crate) fn trace<R>(&self, f: impl FnOnce(&mut Tracer<'_>) -> R) -> R {
        match self.sink.try_borrow_mut() {
            Ok(mut sink) => {
                let mut tracer =
                    Tracer::from_option(sink.as_mut().map(|s| s as &mut dyn TraceSink));
                f(&mut tracer)
            }
            Err(_) => f(&mut Tracer::none()),
        }
    }

    pub(crate) fn locator(&self) -> Locator<'_, PageTree> {
        Locator::new(&self.tree, self.config.matching)
    }

    /// Snapshot of the attached contexts.
    pub(crate) fn contexts(&self) -> Vec<Rc<UiContext>> {
        self.contexts.borrow().values().cloned().collect()
    }

    pub(crate) fn context_of(&self, video: &Element) -> Option<Rc<UiContext>> {
        let id = self.registry.borrow().context_of(video)?;
        self.contexts.borrow().get(&id).cloned()
    }

    pub(crate) fn context_for_button(&self, button: &Element) -> Option<Rc<UiContext>> {
        let id = self.registry.borrow().owner_of(button)?;
        self.contexts.borrow().get(&id).cloned()
    }

    /// Returns the context of `video`, creating it on first sight.
    ///
    /// For a known video this only re-validates the native button binding.
    pub(crate) fn attach(self: &Rc<Self>, video: &Element) -> Option<Rc<UiContext>> {
        if !video.is_connected() {
            return None;
        }
        let native = self.locator().native_volume_button(video);

        let claim = self.registry.borrow_mut().claim(video);
        let id = match claim {
            Claim::Existing(id) => {
                let ctx = self.contexts.borrow().get(&id).cloned()?;
                if let Some(found) = native {
                    self.bind_native_button(&ctx, found);
                }
                ctx.schedule_layout();
                return Some(ctx);
            }
            Claim::New(id) => id,
        };
        let Some(ctx) = self.build_context(id, video) else {
            self.registry.borrow_mut().release(id);
            return None;
        };
        self.contexts.borrow_mut().insert(id, Rc::clone(&ctx));
        self.trace(|t| {
            t.attach(&AttachEvent {
                context: id,
                native_found: native.is_some(),
            });
        });

        if let Some(found) = native {
            self.bind_native_button(&ctx, found);
        }
        audio::attach(self, &ctx);
        deeplink::maybe_arm(self, &ctx);
        ctx.schedule_layout();
        Some(ctx)
    }

    fn build_context(self: &Rc<Self>, id: ContextId, video: &Element) -> Option<Rc<UiContext>> {
        let media = video.dyn_ref::<HtmlVideoElement>()?.clone();
        let host = video.parent_element()?.dyn_into::<HtmlElement>().ok()?;
        self.ensure_host_positioning(&host);
        UiContext::new(self, id, media, host).ok()
    }

    /// Points `ctx` at a native volume button. The button's listeners are
    /// installed the first time any context binds it; a button taken over
    /// from another context is cleared there.
    pub(crate) fn bind_native_button(self: &Rc<Self>, ctx: &UiContext, located: Located<Element>) {
        let button = located.node.clone();
        let tier = located.tier;
        let binding = self
            .registry
            .borrow_mut()
            .bind_button(&button, ctx.id, || self.button_listeners(&button));
        if binding.installed {
            let _ = button.set_attribute(BOUND_ATTR, "1");
        }
        let previous = binding
            .previous_owner
            .and_then(|id| self.contexts.borrow().get(&id).cloned());
        if let Some(previous) = previous {
            previous.clear_native(&button);
        }

        if ctx.set_native(located) {
            self.trace(|t| {
                t.locate(&LocateEvent {
                    context: ctx.id,
                    role: ControlRole::Volume,
                    tier,
                });
            });
            ctx.schedule_layout();
        }
    }

    /// Listeners resolve the owning context on every event, so a button
    /// that moves to another context needs no rebinding.
    fn button_listeners(self: &Rc<Self>, button: &Element) -> Vec<EventListener> {
        let mut out = Vec::with_capacity(5);

        let weak = Rc::downgrade(self);
        out.push(listener(button, "pointerenter", true, move |event| {
            if is_touch(event) {
                return;
            }
            if let Some(ctx) = owner(&weak, event) {
                ctx.button_hover.set(true);
                ctx.open_popover();
            }
        }));

        let weak = Rc::downgrade(self);
        out.push(listener(button, "pointerleave", true, move |event| {
            if is_touch(event) {
                return;
            }
            if let Some(ctx) = owner(&weak, event) {
                ctx.button_hover.set(false);
                ctx.schedule_close_popover();
            }
        }));

        let weak = Rc::downgrade(self);
        out.push(listener(button, "click", true, move |event| {
            let (Some(session), Some(ctx)) = (weak.upgrade(), owner(&weak, event)) else {
                return;
            };
            if ctx.take_native_click_allowance() {
                return;
            }
            ctx.handle_volume_click(&session, event);
        }));

        let weak = Rc::downgrade(self);
        out.push(listener(button, "dblclick", true, move |event| {
            if let (Some(session), Some(ctx)) = (weak.upgrade(), owner(&weak, event)) {
                ctx.handle_volume_double_click(&session, event);
            }
        }));

        let weak = Rc::downgrade(self);
        out.push(listener(button, "keydown", true, move |event| {
            let activates = event
                .dyn_ref::<KeyboardEvent>()
                .is_some_and(|key| matches!(key.key().as_str(), "Enter" | " "));
            if !activates {
                return;
            }
            if let (Some(session), Some(ctx)) = (weak.upgrade(), owner(&weak, event)) {
                ctx.handle_volume_click(&session, event);
            }
        }));
        out
    }

    fn ensure_host_positioning(&self, host: &HtmlElement) {
        if host.get_attribute(HOST_ATTR).as_deref() == Some("1") {
            return;
        }
        let _ = host.set_attribute(HOST_ATTR, "1");
        let _ = host.class_list().add_1("rc-host");
        let is_static = self
            .window
            .get_computed_style(host)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value("position").ok())
            .is_some_and(|position| position == "static");
        if is_static {
            let _ = host.style().set_property("position", "relative");
        }
    }

    pub(crate) fn schedule_scan(&self) {
        if let Some(frame) = self.scan_frame.get() {
            frame.schedule();
        }
    }

    /// Discovers videos, attaching new ones and re-validating known ones.
    pub(crate) fn scan(self: &Rc<Self>) {
        self.check_navigation();
        self.prune();
        for video in self.tree_videos() {
            let _ = self.attach(&video);
        }
    }

    fn tree_videos(&self) -> Vec<Element> {
        self.tree.videos()
    }

    /// Drops contexts whose video left the document, along with their
    /// registry entries and every listener they own.
    fn prune(&self) {
        let mut removed = Vec::new();
        self.contexts.borrow_mut().retain(|_, ctx| {
            let keep = ctx.video.is_connected();
            if !keep {
                removed.push(Rc::clone(ctx));
            }
            keep
        });
        for ctx in removed {
            let released = self.registry.borrow_mut().release(ctx.id);
            for button in released {
                let _ = button.remove_attribute(BOUND_ATTR);
            }
            ctx.detach();
        }
    }

    /// The primary video: under the viewport center, else the most visible.
    pub(crate) fn primary_video(&self) -> Option<Element> {
        let videos = self.tree_videos();
        let rects: Vec<Rect> = videos.iter().map(rect_of).collect();
        let idx = self.config.primary.select(&rects, dom::viewport())?;
        videos.into_iter().nth(idx)
    }

    pub(crate) fn primary_context(&self) -> Option<Rc<UiContext>> {
        self.context_of(&self.primary_video()?)
    }

    pub(crate) fn is_primary(&self, ctx: &UiContext) -> bool {
        self.primary_video()
            .is_some_and(|video| video == *ctx.video.unchecked_ref::<Element>())
    }

    /// The largest video under a viewport point.
    pub(crate) fn video_at(&self, point: Point) -> Option<Element> {
        let videos = self.tree_videos();
        let rects: Vec<Rect> = videos.iter().map(rect_of).collect();
        let idx = geometry::largest_containing(point, &rects)?;
        videos.into_iter().nth(idx)
    }

    /// Reacts to a changed page URL: abandons seeks armed for the old URL,
    /// captures a timestamp target and offers it to every context.
    pub(crate) fn check_navigation(self: &Rc<Self>) {
        let Some(url) = reel_controls_web::current_url() else {
            return;
        };
        if self.last_url.borrow().as_deref() == Some(url.as_str()) {
            return;
        }
        let first_visit = self.last_url.replace(Some(url.clone())).is_none();
        // The referrer only describes how this document was reached, not
        // later client-side routes.
        deeplink::capture(self, first_visit);
        for ctx in self.contexts() {
            let in_flight = ctx.seeker.borrow_mut().leave(&url);
            if in_flight {
                ctx.seek_timer.cancel();
                audio::after_seek(self, &ctx);
            }
            ctx.timestamp_pause_applied.set(false);
            deeplink::maybe_arm(self, &ctx);
            ctx.schedule_layout();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("contexts", &self.contexts.borrow().len())
            .field("last_url", &self.last_url.borrow())
            .finish_non_exhaustive()
    }
}

pub(crate) fn is_touch(event: &Event) -> bool {
    event
        .dyn_ref::<web_sys::PointerEvent>()
        .is_some_and(|pointer| pointer.pointer_type() == "touch")
}

/// The context owning the button an event was dispatched on.
fn owner(session: &Weak<Session>, event: &Event) -> Option<Rc<UiContext>> {
    let button = event.current_target()?.dyn_into::<Element>().ok()?;
    session.upgrade()?.context_for_button(&button)
}
