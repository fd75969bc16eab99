// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform-free logic for custom controls layered over third-party video.
//!
//! `reel_controls_core` decides everything the browser crates execute:
//! which of the host page's buttons is the volume control, where the overlay
//! pieces go, what a mute toggle should do under the autoplay gate, and how
//! a shared timestamp is honored. It never touches a DOM; the browser crate
//! implements [`ControlTree`](locate::ControlTree) and
//! [`KeyValueStore`](storage::KeyValueStore) and feeds measurements in.
//!
//! # Architecture
//!
//! ```text
//!   MutationObserver ─► scan ─► Locator::native_volume_button() ─► UI Context
//!                                                                     │
//!        ┌──────────────────────────┬─────────────────────────────────┤
//!        ▼                          ▼                                 ▼
//!   FrameGate ─► progress_insets   MuteMachine ─► AudioCommand   TimestampSeeker
//!               place_popover                                    ─► SeekStep
//! ```
//!
//! **[`geometry`]** and **[`label`]**: Pure predicates over rectangles and
//! accessible labels.
//!
//! **[`locate`]**: Three-tier native control discovery over any
//! [`ControlTree`](locate::ControlTree).
//!
//! **[`registry`]**: One context per video, one listener set per native
//! button, and button ownership as buttons move between videos.
//!
//! **[`layout`]**: Frame coalescing, progress-bar insets, popover placement.
//!
//! **[`volume`]**: Mute/volume state machine and the activation gate.
//!
//! **[`timestamp`]**: `rc_t` share links, primary-video selection, and the
//! bounded-retry seek state machine.
//!
//! **[`storage`]**: Preference and navigation-intent stores over a
//! key-value backend, with typed failures that degrade to "nothing stored".
//!
//! **[`icon`]**: Best-effort cosmetic re-skinning of native buttons.
//!
//! **[`format`]**: Readout text.
//!
//! **[`config`]**: Tunables.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types,
//! with the [`Tracer`](trace::Tracer) wrapper call sites go through.

pub mod config;
pub mod format;
pub mod geometry;
pub mod icon;
pub mod label;
pub mod layout;
pub mod locate;
pub mod registry;
pub mod storage;
pub mod timestamp;
pub mod trace;
pub mod volume;
