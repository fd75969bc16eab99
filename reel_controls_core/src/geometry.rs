// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry predicates over viewport rectangles.
//!
//! All rectangles are in CSS pixels in viewport coordinates, as returned by
//! `getBoundingClientRect`. None of these functions hold state; they decide
//! whether a candidate element *looks like* an icon-sized transport button
//! sitting in a corner of a video.

use kurbo::{Point, Rect};

use crate::config::MatchConfig;

/// Which bottom corner of a video a control is expected in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Bottom-left, where auxiliary buttons (people tags) live.
    BottomLeft,
    /// Bottom-right, where the volume control lives.
    BottomRight,
}

/// Returns `true` if `rect` has a positive width and height.
#[must_use]
pub fn has_area(rect: Rect) -> bool {
    rect.width() > 0.0 && rect.height() > 0.0
}

/// Returns `true` if `a` and `b` share a region of positive area.
///
/// Touching edges do not count as overlap.
#[must_use]
pub fn overlaps(a: Rect, b: Rect) -> bool {
    let overlap_x = a.x1.min(b.x1) - a.x0.max(b.x0);
    let overlap_y = a.y1.min(b.y1) - a.y0.max(b.y0);
    overlap_x > 0.0 && overlap_y > 0.0
}

/// Returns `true` if `a` and `b` overlap vertically by a positive amount.
#[must_use]
pub fn overlaps_vertically(a: Rect, b: Rect) -> bool {
    a.y1.min(b.y1) - a.y0.max(b.y0) > 0.0
}

/// Returns `true` if `rect` is small enough to be an icon button on `video`.
///
/// Both sides must be at most `min(84px, 28% of video width, 28% of video
/// height)`, which rejects full-size overlays covering the player.
#[must_use]
pub fn is_small_control(rect: Rect, video: Rect, config: &MatchConfig) -> bool {
    let max_side = config
        .icon_max_px
        .min(video.width() * config.icon_max_fraction)
        .min(video.height() * config.icon_max_fraction);
    rect.width() <= max_side && rect.height() <= max_side
}

/// The corner margin for `video`: `min(140px, 22% of its longer side)`.
#[must_use]
pub fn edge_margin(video: Rect, config: &MatchConfig) -> f64 {
    config
        .edge_margin_px
        .min(video.width().max(video.height()) * config.edge_margin_fraction)
}

/// Returns `true` if `button` overlaps `video` and sits near its
/// bottom-right corner.
///
/// The button's right edge and bottom edge must each lie within the corner
/// margin of the video's right and bottom edges, and its center must be on
/// the right half of the video so a control is never both left and right.
#[must_use]
pub fn is_near_bottom_right(button: Rect, video: Rect, config: &MatchConfig) -> bool {
    is_near_corner(button, video, Corner::BottomRight, config)
}

/// Mirror of [`is_near_bottom_right`] for the bottom-left corner.
#[must_use]
pub fn is_near_bottom_left(button: Rect, video: Rect, config: &MatchConfig) -> bool {
    is_near_corner(button, video, Corner::BottomLeft, config)
}

/// Corner test shared by [`is_near_bottom_right`] and [`is_near_bottom_left`].
#[must_use]
pub fn is_near_corner(button: Rect, video: Rect, corner: Corner, config: &MatchConfig) -> bool {
    if !overlaps(button, video) {
        return false;
    }
    let margin = edge_margin(video, config);
    let center_x = video.center().x;
    let button_center_x = button.center().x;
    let within_x = match corner {
        Corner::BottomRight => button.x1 >= video.x1 - margin && button_center_x > center_x,
        Corner::BottomLeft => button.x0 <= video.x0 + margin && button_center_x < center_x,
    };
    let within_y = button.y1 >= video.y1 - margin;
    within_x && within_y
}

/// Euclidean distance from `point` to the nearest point of `rect`.
///
/// Zero when the point lies inside the rectangle.
#[must_use]
pub fn distance_to_rect(point: Point, rect: Rect) -> f64 {
    let dx = (rect.x0 - point.x).max(0.0).max(point.x - rect.x1);
    let dy = (rect.y0 - point.y).max(0.0).max(point.y - rect.y1);
    dx.hypot(dy)
}

/// Distance from `rect`'s bottom-right corner to `video`'s bottom-right
/// corner, used to rank geometry-only candidates.
#[must_use]
pub fn corner_distance(rect: Rect, video: Rect, corner: Corner) -> f64 {
    let dx = match corner {
        Corner::BottomRight => video.x1 - rect.x1,
        Corner::BottomLeft => rect.x0 - video.x0,
    };
    dx.hypot(video.y1 - rect.y1)
}

/// Area of `rect` that falls inside `viewport`.
#[must_use]
pub fn visible_area(rect: Rect, viewport: Rect) -> f64 {
    let visible_x = rect.x1.min(viewport.x1) - rect.x0.max(viewport.x0);
    let visible_y = rect.y1.min(viewport.y1) - rect.y0.max(viewport.y0);
    if visible_x <= 0.0 || visible_y <= 0.0 {
        return 0.0;
    }
    visible_x * visible_y
}

/// Returns `true` if `point` lies inside `rect`, edges included.
#[must_use]
pub fn contains_inclusive(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Index of the rectangle nearest to `point`, if within `radius`.
///
/// Rectangles without area are skipped. Used to associate a bare button
/// with the video it most plausibly controls.
#[must_use]
pub fn nearest_within(point: Point, rects: &[Rect], radius: f64) -> Option<usize> {
    let mut best = None;
    let mut best_dist = f64::INFINITY;
    for (idx, rect) in rects.iter().enumerate() {
        if !has_area(*rect) {
            continue;
        }
        let dist = distance_to_rect(point, *rect);
        if dist < best_dist {
            best_dist = dist;
            best = Some(idx);
        }
    }
    best.filter(|_| best_dist <= radius)
}

/// Index of the largest rectangle containing `point`.
#[must_use]
pub fn largest_containing(point: Point, rects: &[Rect]) -> Option<usize> {
    let mut best = None;
    let mut best_area = 0.0;
    for (idx, rect) in rects.iter().enumerate() {
        if !has_area(*rect) || !contains_inclusive(*rect, point) {
            continue;
        }
        let area = rect.area();
        if area > best_area {
            best_area = area;
            best = Some(idx);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: MatchConfig = MatchConfig::new();

    fn video() -> Rect {
        Rect::new(100.0, 100.0, 500.0, 800.0)
    }

    #[test]
    fn small_control_uses_tightest_cap() {
        // 28% of 400 = 112, 28% of 700 = 196, so the 84px cap wins.
        assert!(is_small_control(Rect::new(0.0, 0.0, 84.0, 84.0), video(), &CFG));
        assert!(!is_small_control(Rect::new(0.0, 0.0, 85.0, 20.0), video(), &CFG));

        // On a tiny video the percentage cap wins: 28% of 100 = 28.
        let tiny = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(is_small_control(Rect::new(0.0, 0.0, 28.0, 28.0), tiny, &CFG));
        assert!(!is_small_control(Rect::new(0.0, 0.0, 30.0, 20.0), tiny, &CFG));
    }

    #[test]
    fn corners_are_exclusive() {
        let v = video();
        let right = Rect::new(460.0, 760.0, 492.0, 792.0);
        let left = Rect::new(108.0, 760.0, 140.0, 792.0);

        assert!(is_near_bottom_right(right, v, &CFG));
        assert!(!is_near_bottom_left(right, v, &CFG));
        assert!(is_near_bottom_left(left, v, &CFG));
        assert!(!is_near_bottom_right(left, v, &CFG));
    }

    #[test]
    fn corners_stay_exclusive_on_narrow_videos() {
        // Margin comes from the longer side (22% of 400 = 88), wider than the
        // video itself; the half-plane test keeps the verdicts apart.
        let narrow = Rect::new(0.0, 0.0, 80.0, 400.0);
        for x in 0..60 {
            let x = f64::from(x);
            let button = Rect::new(x, 370.0, x + 20.0, 390.0);
            let right = is_near_bottom_right(button, narrow, &CFG);
            let left = is_near_bottom_left(button, narrow, &CFG);
            assert!(!(right && left), "button at x={x} classified as both corners");
        }
    }

    #[test]
    fn corner_requires_overlap_and_bottom_margin() {
        let v = video();
        // Outside the video entirely.
        assert!(!is_near_bottom_right(Rect::new(510.0, 760.0, 540.0, 790.0), v, &CFG));
        // Right edge fine but near the top.
        assert!(!is_near_bottom_right(Rect::new(460.0, 110.0, 490.0, 140.0), v, &CFG));
    }

    #[test]
    fn distance_is_zero_inside() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(distance_to_rect(Point::new(5.0, 5.0), r), 0.0);
        let d = distance_to_rect(Point::new(13.0, 14.0), r);
        assert!((d - 5.0).abs() < 1e-9, "expected 5, got {d}");
    }

    #[test]
    fn nearest_respects_radius() {
        let rects = [
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Rect::new(1000.0, 0.0, 1100.0, 100.0),
        ];
        assert_eq!(nearest_within(Point::new(150.0, 50.0), &rects, 240.0), Some(0));
        assert_eq!(nearest_within(Point::new(500.0, 50.0), &rects, 240.0), None);
    }

    #[test]
    fn visible_area_clips_to_viewport() {
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(visible_area(Rect::new(50.0, 50.0, 150.0, 150.0), viewport), 2500.0);
        assert_eq!(visible_area(Rect::new(200.0, 0.0, 300.0, 100.0), viewport), 0.0);
    }
}
