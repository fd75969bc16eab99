// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay layout math.
//!
//! The browser crate measures rectangles and applies styles; everything in
//! between lives here:
//!
//! - [`FrameGate`] coalesces layout and scan requests to one per animation
//!   frame.
//! - [`progress_insets`] keeps the progress bar clear of native buttons.
//! - [`place_popover`] anchors the volume popover to the native button.
//! - [`clamp_into`] keeps the share menu on screen.
//!
//! Rectangles passed to these functions are relative to the overlay host
//! unless noted otherwise.

use std::cell::Cell;

use kurbo::{Point, Rect, Size, Vec2};

use crate::config::LayoutConfig;
use crate::geometry;

/// Coalesces repeated requests into a single pending callback.
///
/// [`request`](Self::request) returns `true` only for the first request
/// after the gate was last [`open`](Self::open)ed; the caller schedules the
/// callback then, and the callback opens the gate before doing its work.
#[derive(Debug, Default)]
pub struct FrameGate {
    queued: Cell<bool>,
}

impl FrameGate {
    /// Creates an open gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            queued: Cell::new(false),
        }
    }

    /// Marks a callback as pending. Returns `true` if the caller must
    /// schedule it, `false` if one is already pending.
    pub fn request(&self) -> bool {
        !self.queued.replace(true)
    }

    /// Clears the pending mark. Call at the start of the callback.
    pub fn open(&self) {
        self.queued.set(false);
    }

    /// Returns `true` if a callback is pending.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.queued.get()
    }
}

/// Layout mode flags of one overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutMode {
    /// Full-bleed short-video route.
    pub reels: bool,
    /// Home-feed route.
    pub feed: bool,
    /// Narrow overlay or reels; popover may need to dodge its anchor.
    pub compact: bool,
}

impl LayoutMode {
    /// Derives the mode from the current route and overlay width.
    #[must_use]
    pub fn detect(path: &str, overlay_width: f64, config: &LayoutConfig) -> Self {
        let reels = is_reels_path(path);
        let feed = !reels && (path.is_empty() || path == "/");
        let compact = reels || (overlay_width > 0.0 && overlay_width < config.compact_width);
        Self {
            reels,
            feed,
            compact,
        }
    }
}

/// Returns `true` for full-bleed short-video routes (`/reels/...`, `/reel/...`).
#[must_use]
pub fn is_reels_path(path: &str) -> bool {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    matches!(segments.next(), Some("reels" | "reel"))
}

/// Left and right progress-bar insets, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressInsets {
    /// Distance from the overlay's left edge.
    pub left: f64,
    /// Distance from the overlay's right edge.
    pub right: f64,
}

/// Computes progress-bar insets for an overlay of `width`.
///
/// `left_button` and `right_button` are the discovered native buttons,
/// relative to the overlay. A discovered button pushes its side's inset past
/// its inner edge plus padding; with only one button the other side mirrors
/// it. Insets are clamped to `[16, width - 16]` and, when together they
/// would leave less than the minimum bar width, shrunk proportionally
/// toward the floor.
#[must_use]
pub fn progress_insets(
    width: f64,
    left_button: Option<Rect>,
    right_button: Option<Rect>,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> ProgressInsets {
    let default = if mode.reels {
        config.reels_inset
    } else {
        config.default_inset
    };
    let mut left = left_button.map_or(default, |r| r.x1 + config.button_padding);
    let mut right = right_button.map_or(default, |r| width - r.x0 + config.button_padding);

    match (left_button.is_some(), right_button.is_some()) {
        (true, false) => right = left,
        (false, true) => left = right,
        _ => {}
    }

    let floor = config.inset_floor;
    let ceiling = (width - floor).max(floor);
    left = left.clamp(floor, ceiling);
    right = right.clamp(floor, ceiling);

    let max_total = width - config.min_bar_width;
    let total = left + right;
    if total > max_total {
        let overflow = total - max_total;
        let slack = (left - floor) + (right - floor);
        if slack > 0.0 {
            let ratio = (overflow / slack).min(1.0);
            left -= (left - floor) * ratio;
            right -= (right - floor) * ratio;
        }
    }

    ProgressInsets {
        left: left.round().max(floor),
        right: right.round().max(floor),
    }
}

/// Where the popover ended up relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopoverSide {
    /// Centered above the anchor.
    Above,
    /// Shifted to the anchor's right.
    Right,
    /// Shifted to the anchor's left.
    Left,
    /// Dropped below the anchor.
    Below,
}

/// Result of [`place_popover`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PopoverPlacement {
    /// Top-left corner of the popover, relative to the overlay.
    pub origin: Point,
    /// Where it sits relative to the anchor.
    pub side: PopoverSide,
}

/// Places a popover of `popover` size above `anchor` inside an overlay of
/// `overlay` size.
///
/// The popover is centered on the anchor's horizontal center and clamped to
/// stay inside the overlay. In compact mode, if it would still cover the
/// anchor, it is shifted sideways (preferring the side with room) and, if
/// neither side has room, dropped below the anchor.
#[must_use]
pub fn place_popover(
    overlay: Size,
    anchor: Rect,
    popover: Size,
    mode: LayoutMode,
    config: &LayoutConfig,
) -> PopoverPlacement {
    let edge = config.popover_edge;
    let gap = config.popover_gap;
    let clamp_x = |x: f64| x.clamp(edge, (overlay.width - popover.width - edge).max(edge));
    let clamp_y = |y: f64| y.clamp(edge, (overlay.height - popover.height - edge).max(edge));

    let above = Point::new(
        clamp_x(anchor.center().x - popover.width / 2.0),
        clamp_y(anchor.y0 - popover.height - gap),
    );
    let covers = |origin: Point| geometry::overlaps(Rect::from_origin_size(origin, popover), anchor);

    if !mode.compact || !covers(above) {
        return PopoverPlacement {
            origin: above,
            side: PopoverSide::Above,
        };
    }

    let top = clamp_y(anchor.center().y - popover.height / 2.0);
    let right_x = anchor.x1 + gap;
    let left_x = anchor.x0 - gap - popover.width;
    let fits_right = right_x + popover.width <= overlay.width - edge;
    let fits_left = left_x >= edge;
    let sideways = match (fits_right, fits_left) {
        (true, _) => Some((Point::new(right_x, top), PopoverSide::Right)),
        (false, true) => Some((Point::new(left_x, top), PopoverSide::Left)),
        (false, false) => None,
    };
    if let Some((origin, side)) = sideways
        && !covers(origin)
    {
        return PopoverPlacement { origin, side };
    }

    let below = Point::new(above.x, anchor.y1 + gap);
    PopoverPlacement {
        origin: below,
        side: PopoverSide::Below,
    }
}

/// Clamps a box of `size` at `origin` so it stays `padding` inside
/// `bounds`. A box larger than `bounds` is pinned to the top-left padding.
#[must_use]
pub fn clamp_into(origin: Point, size: Size, bounds: Rect, padding: f64) -> Point {
    let max_x = (bounds.x1 - size.width - padding).max(bounds.x0 + padding);
    let max_y = (bounds.y1 - size.height - padding).max(bounds.y0 + padding);
    Point::new(
        origin.x.clamp(bounds.x0 + padding, max_x),
        origin.y.clamp(bounds.y0 + padding, max_y),
    )
}

/// Translates a viewport rectangle into coordinates relative to `host`.
#[must_use]
pub fn relative_to(rect: Rect, host: Rect) -> Rect {
    rect - Vec2::new(host.x0, host.y0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: LayoutConfig = LayoutConfig::new();

    fn normal() -> LayoutMode {
        LayoutMode::default()
    }

    #[test]
    fn gate_coalesces_requests() {
        let gate = FrameGate::new();
        assert!(gate.request(), "first request schedules");
        assert!(!gate.request(), "second request in the same frame is absorbed");
        gate.open();
        assert!(gate.request(), "after the callback ran a new request schedules");
    }

    #[test]
    fn defaults_without_buttons() {
        let insets = progress_insets(600.0, None, None, normal(), &CFG);
        assert_eq!(insets, ProgressInsets { left: 24.0, right: 24.0 });

        let reels = LayoutMode {
            reels: true,
            compact: true,
            feed: false,
        };
        let insets = progress_insets(600.0, None, None, reels, &CFG);
        assert_eq!(insets, ProgressInsets { left: 16.0, right: 16.0 });
    }

    #[test]
    fn single_button_is_mirrored() {
        // Volume button 40px wide hugging the right edge at 12px.
        let right = Rect::new(548.0, 540.0, 588.0, 580.0);
        let insets = progress_insets(600.0, None, Some(right), normal(), &CFG);
        assert_eq!(insets.right, 60.0);
        assert_eq!(insets.left, 60.0);
    }

    #[test]
    fn both_buttons_measured_independently() {
        let left = Rect::new(12.0, 540.0, 40.0, 580.0);
        let right = Rect::new(548.0, 540.0, 588.0, 580.0);
        let insets = progress_insets(600.0, Some(left), Some(right), normal(), &CFG);
        assert_eq!(insets, ProgressInsets { left: 48.0, right: 60.0 });
    }

    #[test]
    fn narrow_overlay_keeps_minimum_bar() {
        let left = Rect::new(0.0, 0.0, 90.0, 40.0);
        let right = Rect::new(110.0, 0.0, 200.0, 40.0);
        let insets = progress_insets(300.0, Some(left), Some(right), normal(), &CFG);
        assert!(
            insets.left + insets.right <= 300.0 - 140.0 + 1.0,
            "bar narrower than minimum: {insets:?}"
        );
        assert!(insets.left >= 16.0 && insets.right >= 16.0, "below floor: {insets:?}");
    }

    #[test]
    fn popover_sits_above_anchor() {
        let anchor = Rect::new(500.0, 500.0, 540.0, 540.0);
        let placement = place_popover(
            Size::new(600.0, 600.0),
            anchor,
            Size::new(40.0, 120.0),
            normal(),
            &CFG,
        );
        assert_eq!(placement.side, PopoverSide::Above);
        assert_eq!(placement.origin, Point::new(500.0, 370.0));
    }

    #[test]
    fn compact_popover_dodges_anchor() {
        // Anchor near the top of a short overlay: clamping pushes the popover
        // back over the anchor, so it shifts to the side with room.
        let anchor = Rect::new(320.0, 40.0, 352.0, 72.0);
        let compact = LayoutMode {
            compact: true,
            ..LayoutMode::default()
        };
        let placement = place_popover(
            Size::new(360.0, 400.0),
            anchor,
            Size::new(40.0, 120.0),
            compact,
            &CFG,
        );
        assert_eq!(placement.side, PopoverSide::Left);
        assert!(
            !geometry::overlaps(Rect::from_origin_size(placement.origin, Size::new(40.0, 120.0)), anchor),
            "popover still covers anchor: {placement:?}"
        );
    }

    #[test]
    fn menu_is_kept_inside_viewport() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        let menu = Size::new(200.0, 40.0);
        let near_corner = clamp_into(Point::new(790.0, 590.0), menu, viewport, 8.0);
        assert_eq!(near_corner, Point::new(592.0, 552.0));
        let inside = clamp_into(Point::new(100.0, 100.0), menu, viewport, 8.0);
        assert_eq!(inside, Point::new(100.0, 100.0));
        let tiny = clamp_into(Point::new(50.0, 50.0), menu, Rect::new(0.0, 0.0, 100.0, 30.0), 8.0);
        assert_eq!(tiny, Point::new(8.0, 8.0));
    }

    #[test]
    fn reels_paths_are_detected() {
        assert!(is_reels_path("/reels/abc123/"));
        assert!(is_reels_path("/reel/abc123"));
        assert!(!is_reels_path("/p/abc123/"));
        assert!(LayoutMode::detect("/", 600.0, &CFG).feed);
        assert!(LayoutMode::detect("/p/x/", 300.0, &CFG).compact);
    }
}
