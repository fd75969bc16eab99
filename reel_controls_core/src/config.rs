// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunable thresholds.
//!
//! Every heuristic constant lives in one of the config structs below so the
//! browser crates never carry magic numbers of their own. Each struct has a
//! `const fn` constructor with the production values and a matching
//! [`Default`] impl.

/// Thresholds for the geometry/label matcher and the control locator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchConfig {
    /// Absolute cap on either side of an icon-sized control, in CSS pixels.
    pub icon_max_px: f64,
    /// Cap on either side of an icon-sized control, as a fraction of the
    /// video's width and of its height.
    pub icon_max_fraction: f64,
    /// Absolute cap on the corner margin, in CSS pixels.
    pub edge_margin_px: f64,
    /// Corner margin as a fraction of the video's longer side.
    pub edge_margin_fraction: f64,
    /// Beyond this distance a bare button is not associated with any video.
    pub association_radius_px: f64,
    /// How many ancestor levels the scoped search walks up from the video.
    pub ancestor_depth: usize,
    /// How many ancestor levels the click heuristic inspects for a label.
    pub label_walk_depth: usize,
    /// How many ancestor levels are searched for the video owning a button.
    pub video_walk_depth: usize,
    /// Horizontal slack around the video for document-wide labeled search.
    pub labeled_slack_px: f64,
    /// Weight of the horizontal distance in the labeled-search score.
    pub horizontal_weight: f64,
}

impl MatchConfig {
    /// Production thresholds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            icon_max_px: 84.0,
            icon_max_fraction: 0.28,
            edge_margin_px: 140.0,
            edge_margin_fraction: 0.22,
            association_radius_px: 240.0,
            ancestor_depth: 8,
            label_walk_depth: 6,
            video_walk_depth: 10,
            labeled_slack_px: 32.0,
            horizontal_weight: 0.7,
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Thresholds for the layout engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Progress-bar inset used when no native button bounds it.
    pub default_inset: f64,
    /// Default inset in the full-bleed reels layout.
    pub reels_inset: f64,
    /// Gap between a native button's edge and the progress bar.
    pub button_padding: f64,
    /// No inset may go below this.
    pub inset_floor: f64,
    /// Narrowest progress bar the insets may leave.
    pub min_bar_width: f64,
    /// Vertical gap between the popover and its anchor button.
    pub popover_gap: f64,
    /// Minimum distance between the popover and the overlay edges.
    pub popover_edge: f64,
    /// Overlays narrower than this use the compact layout.
    pub compact_width: f64,
}

impl LayoutConfig {
    /// Production thresholds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default_inset: 24.0,
            reels_inset: 16.0,
            button_padding: 8.0,
            inset_floor: 16.0,
            min_bar_width: 140.0,
            popover_gap: 10.0,
            popover_edge: 8.0,
            compact_width: 360.0,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameters of the timestamp seek state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeekConfig {
    /// Delay before each seek attempt, in milliseconds.
    pub settle_ms: u32,
    /// Delay between seeking and checking convergence, in milliseconds.
    pub verify_ms: u32,
    /// Attempts per URL before giving up.
    pub max_attempts: u8,
    /// Only seek when the playhead is further than this from the target.
    pub seek_tolerance: f64,
    /// The seek has landed when the playhead is within this of the target.
    pub converge_tolerance: f64,
    /// Targets are clamped to `duration - end_guard`.
    pub end_guard: f64,
    /// Stored navigation intents older than this are discarded.
    pub intent_ttl_ms: f64,
}

impl SeekConfig {
    /// Production parameters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            settle_ms: 120,
            verify_ms: 220,
            max_attempts: 6,
            seek_tolerance: 0.4,
            converge_tolerance: 0.6,
            end_guard: 0.05,
            intent_ttl_ms: 120_000.0,
        }
    }
}

impl Default for SeekConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Delays of the per-context UI timers, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    /// Popover close delay after the pointer leaves.
    pub popover_close_ms: u32,
    /// How long the volume percentage stays visible after a change.
    pub value_flash_ms: u32,
    /// Delay before re-skinning a native icon after a toggle.
    pub icon_resync_ms: u32,
    /// How long the share menu shows its copy outcome.
    pub share_label_ms: u32,
}

impl TimingConfig {
    /// Production delays.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            popover_close_ms: 140,
            value_flash_ms: 900,
            icon_resync_ms: 250,
            share_label_ms: 1_200,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// All configuration of one overlay session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverlayConfig {
    /// Matcher and locator thresholds.
    pub matching: MatchConfig,
    /// Layout thresholds.
    pub layout: LayoutConfig,
    /// Timestamp seek parameters.
    pub seek: SeekConfig,
    /// UI timer delays.
    pub timing: TimingConfig,
    /// Primary-video selection policy.
    pub primary: crate::timestamp::PrimaryPolicy,
}
