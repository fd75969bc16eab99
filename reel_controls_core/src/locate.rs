// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native-control discovery.
//!
//! The [`Locator`] finds, for a given video, the host page's own volume
//! button and the auxiliary button in the opposite corner that the progress
//! bar must not cover. It works against any [`ControlTree`], so the same
//! heuristics run over the live DOM and over synthetic trees in tests.
//!
//! # Tiers
//!
//! Each search falls back through three tiers of decreasing precision; the
//! first hit wins:
//!
//! 1. [`LocateTier::Scoped`]: labeled controls among the descendants of the
//!    video's ancestors (up to 8 levels), required to overlap the video.
//! 2. [`LocateTier::Labeled`]: labeled controls anywhere in the document,
//!    ranked by weighted distance to the relevant side of the video.
//! 3. [`LocateTier::Geometric`]: unlabeled, icon-sized clickables with
//!    vector markup in the relevant bottom corner of the video.
//!
//! Nodes inside the overlay's own subtree are never candidates.

use kurbo::Rect;

use crate::config::MatchConfig;
use crate::geometry::{self, Corner};
use crate::label::TermSet;

/// Read-only view of a document, as far as control discovery needs it.
///
/// "Clickable" means a `button`, an element with `role="button"`, or an
/// element with a non-negative `tabindex`.
pub trait ControlTree {
    /// Element handle. Equality is node identity.
    type Node: Clone + PartialEq;

    /// The element's bounding rectangle in viewport coordinates.
    fn rect(&self, node: &Self::Node) -> Rect;

    /// The parent element, if any.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Clickable descendants of `root` (excluding `root`), in document order.
    fn clickable_descendants(&self, root: &Self::Node) -> Vec<Self::Node>;

    /// Every clickable element in the document, in document order.
    fn clickables(&self) -> Vec<Self::Node>;

    /// Every video element in the document, in document order.
    fn videos(&self) -> Vec<Self::Node>;

    /// Returns `true` if `node` is a video element.
    fn is_video(&self, node: &Self::Node) -> bool;

    /// Returns `true` if `node` is clickable.
    fn is_clickable(&self, node: &Self::Node) -> bool;

    /// The element's accessible label: `aria-label`, else `title`, else
    /// tooltip data.
    fn label(&self, node: &Self::Node) -> Option<String>;

    /// Returns `true` if the element contains `svg`, `path` or `use` markup.
    fn has_vector_icon(&self, node: &Self::Node) -> bool;

    /// Returns `true` if the element belongs to an injected overlay.
    fn is_overlay_owned(&self, node: &Self::Node) -> bool;

    /// Returns `true` if `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;
}

/// Which fallback tier produced a [`Located`] control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocateTier {
    /// Labeled control under one of the video's ancestors.
    Scoped,
    /// Labeled control found by a document-wide search.
    Labeled,
    /// Unlabeled icon control found by geometry alone.
    Geometric,
}

impl LocateTier {
    /// Short name for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scoped => "scoped",
            Self::Labeled => "labeled",
            Self::Geometric => "geometric",
        }
    }
}

/// A discovered native control.
#[derive(Clone, Debug, PartialEq)]
pub struct Located<N> {
    /// The control element.
    pub node: N,
    /// How it was found.
    pub tier: LocateTier,
}

/// Runs the discovery heuristics over a [`ControlTree`].
#[derive(Debug)]
pub struct Locator<'a, T> {
    tree: &'a T,
    config: MatchConfig,
}

impl<'a, T: ControlTree> Locator<'a, T> {
    /// Creates a locator over `tree`.
    #[must_use]
    pub fn new(tree: &'a T, config: MatchConfig) -> Self {
        Self { tree, config }
    }

    /// Finds the native volume control of `video`.
    pub fn native_volume_button(&self, video: &T::Node) -> Option<Located<T::Node>> {
        self.find(video, TermSet::Volume, Corner::BottomRight)
    }

    /// Finds the auxiliary control in the bottom-left corner of `video`.
    pub fn left_ui_button(&self, video: &T::Node) -> Option<Located<T::Node>> {
        self.find(video, TermSet::LeftUi, Corner::BottomLeft)
    }

    fn find(&self, video: &T::Node, terms: TermSet, corner: Corner) -> Option<Located<T::Node>> {
        let video_rect = self.tree.rect(video);
        if let Some(node) = self.scoped(video, video_rect, terms) {
            return Some(Located {
                node,
                tier: LocateTier::Scoped,
            });
        }
        if !geometry::has_area(video_rect) {
            return None;
        }
        if let Some(node) = self.labeled(video_rect, terms, corner) {
            return Some(Located {
                node,
                tier: LocateTier::Labeled,
            });
        }
        self.geometric(video_rect, corner).map(|node| Located {
            node,
            tier: LocateTier::Geometric,
        })
    }

    fn is_candidate(&self, node: &T::Node, terms: TermSet) -> bool {
        !self.tree.is_overlay_owned(node)
            && self
                .tree
                .label(node)
                .is_some_and(|label| terms.matches(&label))
    }

    fn scoped(&self, video: &T::Node, video_rect: Rect, terms: TermSet) -> Option<T::Node> {
        let mut level = self.tree.parent(video);
        for _ in 0..self.config.ancestor_depth {
            let ancestor = level?;
            let hit = self
                .tree
                .clickable_descendants(&ancestor)
                .into_iter()
                .filter(|node| self.is_candidate(node, terms))
                .find(|node| geometry::overlaps(video_rect, self.tree.rect(node)));
            if hit.is_some() {
                return hit;
            }
            level = self.tree.parent(&ancestor);
        }
        None
    }

    fn labeled(&self, video_rect: Rect, terms: TermSet, corner: Corner) -> Option<T::Node> {
        let slack = self.config.labeled_slack_px;
        let video_center_y = video_rect.center().y;
        let mut best = None;
        let mut best_score = f64::INFINITY;
        for node in self.tree.clickables() {
            if !self.is_candidate(&node, terms) {
                continue;
            }
            let rect = self.tree.rect(&node);
            if !geometry::has_area(rect) || !geometry::overlaps_vertically(rect, video_rect) {
                continue;
            }
            let center = rect.center();
            if center.x < video_rect.x0 - slack || center.x > video_rect.x1 + slack {
                continue;
            }
            let dx = match corner {
                Corner::BottomLeft => {
                    if center.x >= video_rect.x0 + video_rect.width() * 0.55 {
                        continue;
                    }
                    (rect.x1 - video_rect.x0).abs()
                }
                Corner::BottomRight => {
                    if center.x <= video_rect.x0 + video_rect.width() * 0.45 {
                        continue;
                    }
                    (video_rect.x1 - rect.x0).abs()
                }
            };
            let dy = (video_center_y - center.y).abs();
            let score = dx * self.config.horizontal_weight + dy;
            if score < best_score {
                best_score = score;
                best = Some(node);
            }
        }
        best
    }

    fn geometric(&self, video_rect: Rect, corner: Corner) -> Option<T::Node> {
        let mut best = None;
        let mut best_score = f64::INFINITY;
        for node in self.tree.clickables() {
            if self.tree.is_overlay_owned(&node) {
                continue;
            }
            let rect = self.tree.rect(&node);
            if !self.is_icon_control(&node, rect, video_rect, corner) {
                continue;
            }
            let score = geometry::corner_distance(rect, video_rect, corner);
            if score < best_score {
                best_score = score;
                best = Some(node);
            }
        }
        best
    }

    fn is_icon_control(&self, node: &T::Node, rect: Rect, video_rect: Rect, corner: Corner) -> bool {
        geometry::has_area(rect)
            && geometry::is_near_corner(rect, video_rect, corner, &self.config)
            && geometry::is_small_control(rect, video_rect, &self.config)
            && self.tree.has_vector_icon(node)
    }

    /// Resolves a click target to the volume control it belongs to.
    ///
    /// Tries, in order: the nearest clickable ancestor with a volume label;
    /// the nearest clickable ancestor that looks like an icon control in the
    /// bottom-right corner of the nearest video; the first of up to 6
    /// ancestors carrying a volume label.
    pub fn volume_button_from_target(&self, target: &T::Node) -> Option<T::Node> {
        if self.tree.is_overlay_owned(target) {
            return None;
        }
        let mut node = Some(target.clone());
        while let Some(current) = node {
            if self.tree.is_clickable(&current) && self.is_candidate(&current, TermSet::Volume) {
                return Some(current);
            }
            node = self.tree.parent(&current);
        }

        if let Some(clickable) = self.closest_clickable(target)
            && let Some(video) = self.closest_video_to(&clickable)
        {
            let rect = self.tree.rect(&clickable);
            let video_rect = self.tree.rect(&video);
            if self.is_icon_control(&clickable, rect, video_rect, Corner::BottomRight) {
                return Some(clickable);
            }
        }

        let mut node = Some(target.clone());
        for _ in 0..self.config.label_walk_depth {
            let Some(current) = node else {
                break;
            };
            if self
                .tree
                .label(&current)
                .is_some_and(|label| TermSet::Volume.matches(&label))
            {
                return self.closest_clickable(&current);
            }
            node = self.tree.parent(&current);
        }
        None
    }

    /// The nearest clickable element at or above `node`.
    pub fn closest_clickable(&self, node: &T::Node) -> Option<T::Node> {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if self.tree.is_clickable(&n) {
                return Some(n);
            }
            current = self.tree.parent(&n);
        }
        None
    }

    /// The video nearest to `button`'s center, within the association radius.
    pub fn closest_video_to(&self, button: &T::Node) -> Option<T::Node> {
        let center = self.tree.rect(button).center();
        let videos = self.tree.videos();
        let rects: Vec<Rect> = videos.iter().map(|v| self.tree.rect(v)).collect();
        let idx = geometry::nearest_within(center, &rects, self.config.association_radius_px)?;
        videos.into_iter().nth(idx)
    }

    /// The video a native control belongs to.
    ///
    /// Walks up to 10 ancestors looking for a video at or below each level,
    /// then falls back to [`closest_video_to`](Self::closest_video_to).
    pub fn video_for_button(&self, button: &T::Node) -> Option<T::Node> {
        let mut node = Some(button.clone());
        let videos = self.tree.videos();
        for _ in 0..self.config.video_walk_depth {
            let Some(current) = node else {
                break;
            };
            if self.tree.is_video(&current) {
                return Some(current);
            }
            if let Some(video) = videos.iter().find(|v| self.tree.contains(&current, v)) {
                return Some(video.clone());
            }
            node = self.tree.parent(&current);
        }
        self.closest_video_to(button)
    }
}

/// An in-memory [`ControlTree`] for tests.
#[cfg(test)]
pub(crate) mod synthetic {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) enum Kind {
        Block,
        Video,
        Button,
        Icon,
    }

    #[derive(Clone, Debug)]
    pub(crate) struct Element {
        pub(crate) parent: Option<usize>,
        pub(crate) kind: Kind,
        pub(crate) rect: Rect,
        pub(crate) label: Option<String>,
        pub(crate) overlay: bool,
    }

    /// Nodes are indices; index order is document order.
    #[derive(Debug, Default)]
    pub(crate) struct SyntheticTree {
        pub(crate) elements: Vec<Element>,
    }

    impl SyntheticTree {
        pub(crate) fn add(&mut self, parent: Option<usize>, kind: Kind, rect: Rect) -> usize {
            self.elements.push(Element {
                parent,
                kind,
                rect,
                label: None,
                overlay: false,
            });
            self.elements.len() - 1
        }

        pub(crate) fn labeled(&mut self, parent: Option<usize>, rect: Rect, label: &str) -> usize {
            let idx = self.add(parent, Kind::Button, rect);
            self.elements[idx].label = Some(label.to_owned());
            idx
        }

        /// A button with an icon child.
        pub(crate) fn icon_button(&mut self, parent: Option<usize>, rect: Rect) -> usize {
            let idx = self.add(parent, Kind::Button, rect);
            self.add(Some(idx), Kind::Icon, rect);
            idx
        }
    }

    impl ControlTree for SyntheticTree {
        type Node = usize;

        fn rect(&self, node: &usize) -> Rect {
            self.elements[*node].rect
        }

        fn parent(&self, node: &usize) -> Option<usize> {
            self.elements[*node].parent
        }

        fn clickable_descendants(&self, root: &usize) -> Vec<usize> {
            (0..self.elements.len())
                .filter(|n| n != root && self.contains(root, n) && self.is_clickable(n))
                .collect()
        }

        fn clickables(&self) -> Vec<usize> {
            (0..self.elements.len())
                .filter(|n| self.is_clickable(n))
                .collect()
        }

        fn videos(&self) -> Vec<usize> {
            (0..self.elements.len()).filter(|n| self.is_video(n)).collect()
        }

        fn is_video(&self, node: &usize) -> bool {
            self.elements[*node].kind == Kind::Video
        }

        fn is_clickable(&self, node: &usize) -> bool {
            self.elements[*node].kind == Kind::Button
        }

        fn label(&self, node: &usize) -> Option<String> {
            self.elements[*node].label.clone()
        }

        fn has_vector_icon(&self, node: &usize) -> bool {
            (0..self.elements.len())
                .any(|n| self.elements[n].kind == Kind::Icon && self.contains(node, &n))
        }

        fn is_overlay_owned(&self, node: &usize) -> bool {
            let mut current = Some(*node);
            while let Some(n) = current {
                if self.elements[n].overlay {
                    return true;
                }
                current = self.elements[n].parent;
            }
            false
        }

        fn contains(&self, ancestor: &usize, node: &usize) -> bool {
            let mut current = Some(*node);
            while let Some(n) = current {
                if n == *ancestor {
                    return true;
                }
                current = self.elements[n].parent;
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::synthetic::{Kind, SyntheticTree};
    use super::*;

    fn player() -> Rect {
        Rect::new(0.0, 0.0, 400.0, 700.0)
    }

    /// root > card > wrap > video, with an unlabeled icon button in the
    /// bottom-right corner under `wrap`.
    fn feed_card(tree: &mut SyntheticTree) -> (usize, usize, usize) {
        let root = tree.add(None, Kind::Block, Rect::new(0.0, 0.0, 1200.0, 3000.0));
        let card = tree.add(Some(root), Kind::Block, player());
        let wrap = tree.add(Some(card), Kind::Block, player());
        let video = tree.add(Some(wrap), Kind::Video, player());
        (card, wrap, video)
    }

    #[test]
    fn scoped_label_short_circuits_other_tiers() {
        let mut tree = SyntheticTree::default();
        let (card, wrap, video) = feed_card(&mut tree);
        // Unlabeled icon sitting right in the corner: tier 3 would pick it.
        tree.icon_button(Some(wrap), Rect::new(364.0, 664.0, 396.0, 696.0));
        // Labeled mute button under the video's grandparent.
        let mute = tree.labeled(Some(card), Rect::new(340.0, 640.0, 372.0, 672.0), "Audio is muted");

        let locator = Locator::new(&tree, MatchConfig::new());
        let found = locator.native_volume_button(&video).expect("volume button");
        assert_eq!(found.node, mute);
        assert_eq!(found.tier, LocateTier::Scoped);
    }

    #[test]
    fn scoped_search_requires_overlap() {
        let mut tree = SyntheticTree::default();
        let (card, _wrap, video) = feed_card(&mut tree);
        // Labeled, but beside the video rather than over it.
        tree.labeled(Some(card), Rect::new(404.0, 640.0, 428.0, 672.0), "Mute");

        let locator = Locator::new(&tree, MatchConfig::new());
        let found = locator.native_volume_button(&video).expect("labeled fallback");
        // Still found, but by the document-wide labeled tier.
        assert_eq!(found.tier, LocateTier::Labeled);
    }

    #[test]
    fn labeled_tier_prefers_trailing_side() {
        let mut tree = SyntheticTree::default();
        let (_card, _wrap, video) = feed_card(&mut tree);
        let elsewhere = tree.add(None, Kind::Block, Rect::new(0.0, 0.0, 1200.0, 3000.0));
        let left = tree.labeled(Some(elsewhere), Rect::new(8.0, 340.0, 40.0, 372.0), "Volume");
        let right = tree.labeled(Some(elsewhere), Rect::new(404.0, 600.0, 430.0, 626.0), "Volume");

        let locator = Locator::new(&tree, MatchConfig::new());
        let found = locator.native_volume_button(&video).expect("volume button");
        assert_eq!(found.node, right);
        assert_ne!(found.node, left);
        assert_eq!(found.tier, LocateTier::Labeled);
    }

    #[test]
    fn geometric_tier_picks_closest_to_corner() {
        let mut tree = SyntheticTree::default();
        let (_card, wrap, video) = feed_card(&mut tree);
        let far = tree.icon_button(Some(wrap), Rect::new(320.0, 620.0, 352.0, 652.0));
        let near = tree.icon_button(Some(wrap), Rect::new(360.0, 660.0, 392.0, 692.0));
        // Too big to be an icon.
        tree.icon_button(Some(wrap), Rect::new(200.0, 500.0, 398.0, 698.0));

        let locator = Locator::new(&tree, MatchConfig::new());
        let found = locator.native_volume_button(&video).expect("geometric hit");
        assert_eq!(found.node, near);
        assert_ne!(found.node, far);
        assert_eq!(found.tier, LocateTier::Geometric);
    }

    #[test]
    fn geometric_tier_requires_vector_markup() {
        let mut tree = SyntheticTree::default();
        let (_card, wrap, video) = feed_card(&mut tree);
        tree.add(Some(wrap), Kind::Button, Rect::new(360.0, 660.0, 392.0, 692.0));

        let locator = Locator::new(&tree, MatchConfig::new());
        assert!(locator.native_volume_button(&video).is_none());
    }

    #[test]
    fn overlay_controls_are_never_discovered() {
        let mut tree = SyntheticTree::default();
        let (_card, wrap, video) = feed_card(&mut tree);
        let overlay = tree.add(Some(wrap), Kind::Block, player());
        tree.elements[overlay].overlay = true;
        tree.labeled(Some(overlay), Rect::new(340.0, 640.0, 372.0, 672.0), "Volume");
        tree.icon_button(Some(overlay), Rect::new(360.0, 660.0, 392.0, 692.0));

        let locator = Locator::new(&tree, MatchConfig::new());
        assert!(locator.native_volume_button(&video).is_none());
    }

    #[test]
    fn left_button_found_by_label() {
        let mut tree = SyntheticTree::default();
        let (card, _wrap, video) = feed_card(&mut tree);
        let tags = tree.labeled(Some(card), Rect::new(12.0, 660.0, 40.0, 688.0), "Tagged people");

        let locator = Locator::new(&tree, MatchConfig::new());
        let found = locator.left_ui_button(&video).expect("left button");
        assert_eq!(found.node, tags);
    }

    #[test]
    fn click_on_icon_resolves_to_labeled_button() {
        let mut tree = SyntheticTree::default();
        let (card, _wrap, _video) = feed_card(&mut tree);
        let mute = tree.labeled(Some(card), Rect::new(340.0, 640.0, 372.0, 672.0), "Mute");
        let icon = tree.add(Some(mute), Kind::Icon, Rect::new(346.0, 646.0, 366.0, 666.0));

        let locator = Locator::new(&tree, MatchConfig::new());
        assert_eq!(locator.volume_button_from_target(&icon), Some(mute));
    }

    #[test]
    fn click_on_unlabeled_corner_icon_resolves_by_geometry() {
        let mut tree = SyntheticTree::default();
        let (_card, wrap, _video) = feed_card(&mut tree);
        let button = tree.icon_button(Some(wrap), Rect::new(360.0, 660.0, 392.0, 692.0));
        let icon = button + 1;

        let locator = Locator::new(&tree, MatchConfig::new());
        assert_eq!(locator.volume_button_from_target(&icon), Some(button));
    }

    #[test]
    fn button_is_associated_with_its_video() {
        let mut tree = SyntheticTree::default();
        let (card, _wrap, video) = feed_card(&mut tree);
        let mute = tree.labeled(Some(card), Rect::new(340.0, 640.0, 372.0, 672.0), "Mute");
        let stray = tree.add(None, Kind::Button, Rect::new(2000.0, 2000.0, 2020.0, 2020.0));

        let locator = Locator::new(&tree, MatchConfig::new());
        assert_eq!(locator.video_for_button(&mute), Some(video));
        assert_eq!(locator.video_for_button(&stray), None);
    }
}
