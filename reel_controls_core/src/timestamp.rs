// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timestamp deep links.
//!
//! A share link is any page URL with `rc_t=<seconds>` set. On arrival the
//! target is captured from the current URL (or the referrer, when the route
//! change already stripped it), persisted per destination path, and handed
//! to a [`TimestampSeeker`] on the primary video.
//!
//! # Seek state machine
//!
//! ```text
//!   Idle ──arm──► Seeking ──fire──► Verifying ──fire──► Satisfied
//!                   ▲  │                 │
//!                   │  └─ no duration ───┤ drift > 0.6s
//!                   └────────────────────┘
//!   (any) ── attempts exhausted ──► Abandoned
//! ```
//!
//! Every transition returns a [`SeekStep`] telling the caller which single
//! timer to schedule next.

use kurbo::{Point, Rect};
use url::Url;

use crate::config::SeekConfig;
use crate::geometry;

/// Query parameter carrying the shared playback position.
pub const TIMESTAMP_PARAM: &str = "rc_t";

/// Parses the `rc_t` parameter of `url`.
///
/// Returns `None` if the URL does not parse, the parameter is absent, or its
/// value is not a non-negative integer.
#[must_use]
pub fn timestamp_from_url(url: &str) -> Option<u32> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == TIMESTAMP_PARAM)
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
}

/// Returns `url` with `rc_t` set to `seconds`, replacing any previous value.
#[must_use]
pub fn with_timestamp(url: &str, seconds: u32) -> Option<String> {
    let mut url = Url::parse(url).ok()?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != TIMESTAMP_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(TIMESTAMP_PARAM, &seconds.to_string());
    }
    Some(url.into())
}

/// The shareable second for a playback position: floored, never negative.
#[must_use]
pub fn share_seconds(current_time: f64) -> u32 {
    if !current_time.is_finite() || current_time <= 0.0 {
        return 0;
    }
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "finite, positive, and clamped to u32 range before the cast"
    )]
    let seconds = current_time.floor().min(f64::from(u32::MAX)) as u32;
    seconds
}

/// Returns `true` for content-addressed paths: `/p/<id>`, `/reel/<id>`,
/// `/reels/<id>`, `/tv/<id>`, optionally under a `/<user>/` prefix.
#[must_use]
pub fn is_permalink_path(path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments
        .windows(2)
        .any(|pair| matches!(pair[0], "p" | "reel" | "reels" | "tv") && !pair[1].is_empty())
}

/// Picks the canonical permalink to share.
///
/// `candidates` are hrefs of nearby anchors and the page's canonical link,
/// in preference order; relative hrefs resolve against `page_url`. The first
/// one with a permalink path wins, stripped of query and fragment. Falls
/// back to `page_url`.
#[must_use]
pub fn resolve_permalink<'a>(candidates: impl IntoIterator<Item = &'a str>, page_url: &str) -> String {
    let base = Url::parse(page_url).ok();
    for href in candidates {
        let parsed = match &base {
            Some(base) => base.join(href),
            None => Url::parse(href),
        };
        let Ok(mut url) = parsed else {
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") || !is_permalink_path(url.path()) {
            continue;
        }
        url.set_query(None);
        url.set_fragment(None);
        return url.into();
    }
    page_url.to_owned()
}

/// Builds the share link for a video at `current_time`.
#[must_use]
pub fn build_share_url<'a>(
    current_time: f64,
    candidates: impl IntoIterator<Item = &'a str>,
    page_url: &str,
) -> String {
    let permalink = resolve_permalink(candidates, page_url);
    let seconds = share_seconds(current_time);
    with_timestamp(&permalink, seconds).unwrap_or(permalink)
}

/// The target to honor on arrival: the current URL's parameter, else the
/// referrer's.
#[must_use]
pub fn capture_target(current_url: &str, referrer: Option<&str>) -> Option<u32> {
    timestamp_from_url(current_url).or_else(|| referrer.and_then(timestamp_from_url))
}

/// Clamps `seconds` into `[0, duration - end_guard]`.
#[must_use]
pub fn clamp_target(seconds: u32, duration: f64, config: &SeekConfig) -> f64 {
    f64::from(seconds).clamp(0.0, (duration - config.end_guard).max(0.0))
}

/// Returns `true` if `duration` is known: finite and positive.
#[must_use]
pub fn has_duration(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}

/// Snapshot of a video's playhead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playhead {
    /// `currentTime`, in seconds.
    pub current_time: f64,
    /// `duration`, in seconds; `NaN` while unknown.
    pub duration: f64,
}

/// State of a [`TimestampSeeker`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeekPhase {
    /// No target.
    Idle,
    /// Waiting to attempt a seek to `target` seconds.
    Seeking {
        /// Requested position.
        target: u32,
    },
    /// Seeked to `position`; waiting to check convergence.
    Verifying {
        /// Requested position.
        target: u32,
        /// Clamped position actually sought.
        position: f64,
    },
    /// The playhead converged on the target.
    Satisfied,
    /// Attempts were exhausted.
    Abandoned,
}

/// What the caller must do after a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeekStep {
    /// Schedule the next [`TimestampSeeker::fire`] after `delay_ms`.
    Wait {
        /// Delay in milliseconds.
        delay_ms: u32,
    },
    /// Set `currentTime` to `to` (if given), then schedule the next
    /// [`TimestampSeeker::fire`] after `delay_ms`.
    Seek {
        /// Position to write, or `None` if already within tolerance.
        to: Option<f64>,
        /// Delay before verification, in milliseconds.
        delay_ms: u32,
    },
    /// Converged; clear persisted intent and mark the URL satisfied.
    Satisfied,
    /// Gave up; clear persisted intent.
    Abandoned,
    /// Nothing to do.
    Idle,
}

/// Bounded-retry seek toward a shared timestamp, per UI Context.
#[derive(Clone, Debug, PartialEq)]
pub struct TimestampSeeker {
    config: SeekConfig,
    phase: SeekPhase,
    attempts: u8,
    url: Option<String>,
    path: Option<String>,
}

impl TimestampSeeker {
    /// An idle seeker.
    #[must_use]
    pub fn new(config: SeekConfig) -> Self {
        Self {
            config,
            phase: SeekPhase::Idle,
            attempts: 0,
            url: None,
            path: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SeekPhase {
        self.phase
    }

    /// Attempts made for the current URL.
    #[must_use]
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// The URL the attempt counter belongs to.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Path of the page the seek was armed on; its navigation intent is
    /// the one to clear when the seek ends.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns `true` while a timer should be pending.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, SeekPhase::Seeking { .. } | SeekPhase::Verifying { .. })
    }

    /// Starts (or restarts) seeking to `target` for the page at `url`, whose
    /// path is `path`.
    ///
    /// The attempt counter resets when `url` differs from the last one. A
    /// URL that was already satisfied or abandoned stays that way.
    pub fn arm(&mut self, url: &str, path: &str, target: u32) -> SeekStep {
        if self.url.as_deref() != Some(url) {
            self.url = Some(url.to_owned());
            self.path = Some(path.to_owned());
            self.attempts = 0;
        } else if matches!(self.phase, SeekPhase::Satisfied | SeekPhase::Abandoned) {
            return SeekStep::Idle;
        }
        if self.attempts >= self.config.max_attempts {
            self.phase = SeekPhase::Abandoned;
            return SeekStep::Abandoned;
        }
        self.phase = SeekPhase::Seeking { target };
        SeekStep::Wait {
            delay_ms: self.config.settle_ms,
        }
    }

    /// Forgets everything armed for a page other than `url`: phase, attempt
    /// counter, URL and path.
    ///
    /// Returns `true` if a seek was in flight; the caller cancels its timer
    /// and releases whatever was held for it.
    pub fn leave(&mut self, url: &str) -> bool {
        if self.url.is_none() || self.url.as_deref() == Some(url) {
            return false;
        }
        let was_active = self.is_active();
        self.phase = SeekPhase::Idle;
        self.attempts = 0;
        self.url = None;
        self.path = None;
        was_active
    }

    /// Drops any target without touching the attempt counter.
    pub fn cancel(&mut self) {
        if self.is_active() {
            self.phase = SeekPhase::Idle;
        }
    }

    /// Advances the machine when its timer fires.
    pub fn fire(&mut self, playhead: Playhead) -> SeekStep {
        match self.phase {
            SeekPhase::Seeking { target } => {
                self.attempts = self.attempts.saturating_add(1);
                if !has_duration(playhead.duration) {
                    return self.retry(target);
                }
                let position = clamp_target(target, playhead.duration, &self.config);
                let drift = (playhead.current_time - position).abs();
                self.phase = SeekPhase::Verifying { target, position };
                SeekStep::Seek {
                    to: (drift > self.config.seek_tolerance).then_some(position),
                    delay_ms: self.config.verify_ms,
                }
            }
            SeekPhase::Verifying { target, position } => {
                if (playhead.current_time - position).abs() <= self.config.converge_tolerance {
                    self.phase = SeekPhase::Satisfied;
                    SeekStep::Satisfied
                } else {
                    self.retry(target)
                }
            }
            SeekPhase::Idle | SeekPhase::Satisfied | SeekPhase::Abandoned => SeekStep::Idle,
        }
    }

    fn retry(&mut self, target: u32) -> SeekStep {
        if self.attempts >= self.config.max_attempts {
            self.phase = SeekPhase::Abandoned;
            return SeekStep::Abandoned;
        }
        self.phase = SeekPhase::Seeking { target };
        SeekStep::Wait {
            delay_ms: self.config.settle_ms,
        }
    }
}

/// How the primary video is chosen among those on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimaryPolicy {
    /// Prefer the video under the viewport center over the one with the
    /// largest visible area.
    pub center_first: bool,
}

impl PrimaryPolicy {
    /// Center-first selection.
    #[must_use]
    pub const fn new() -> Self {
        Self { center_first: true }
    }

    /// Index of the primary video among `rects` inside `viewport`.
    ///
    /// With `center_first`, the largest video containing the viewport center
    /// wins; otherwise (or if none contains it) the one with the greatest
    /// visible area does.
    #[must_use]
    pub fn select(&self, rects: &[Rect], viewport: Rect) -> Option<usize> {
        if self.center_first {
            let center = Point::new(viewport.center().x, viewport.center().y);
            if let Some(idx) = geometry::largest_containing(center, rects) {
                return Some(idx);
            }
        }
        let mut best = None;
        let mut best_area = 0.0;
        for (idx, rect) in rects.iter().enumerate() {
            if !geometry::has_area(*rect) {
                continue;
            }
            let area = geometry::visible_area(*rect, viewport);
            if area > best_area {
                best_area = area;
                best = Some(idx);
            }
        }
        best
    }
}

impl Default for PrimaryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Remembers which (URL, video) pair already received its timestamp.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppliedMarker<K> {
    applied: Option<(String, K)>,
}

impl<K: PartialEq> AppliedMarker<K> {
    /// Nothing applied yet.
    #[must_use]
    pub fn new() -> Self {
        Self { applied: None }
    }

    /// Records that `video` was satisfied at `url`.
    pub fn mark(&mut self, url: &str, video: K) {
        self.applied = Some((url.to_owned(), video));
    }

    /// Returns `true` if `video` was already satisfied at `url`.
    #[must_use]
    pub fn is_applied(&self, url: &str, video: &K) -> bool {
        self.applied
            .as_ref()
            .is_some_and(|(u, v)| u == url && v == video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFG: SeekConfig = SeekConfig::new();

    #[test]
    fn parses_only_non_negative_integers() {
        assert_eq!(timestamp_from_url("https://x.test/p/a/?rc_t=125"), Some(125));
        assert_eq!(timestamp_from_url("https://x.test/p/a/?rc_t=-3"), None);
        assert_eq!(timestamp_from_url("https://x.test/p/a/?rc_t=abc"), None);
        assert_eq!(timestamp_from_url("https://x.test/p/a/"), None);
        assert_eq!(timestamp_from_url("not a url"), None);
    }

    #[test]
    fn share_url_floors_and_round_trips() {
        let page = "https://x.test/?variant=feed";
        let anchors = ["/explore/", "/p/Cabc123/?utm=1#c"];
        let link = build_share_url(125.7, anchors, page);
        assert_eq!(link, "https://x.test/p/Cabc123/?rc_t=125");

        let seconds = timestamp_from_url(&link).unwrap();
        assert_eq!(seconds, 125);
        assert_eq!(clamp_target(seconds, 300.0, &CFG), 125.0);
        let short = clamp_target(seconds, 100.0, &CFG);
        assert!((short - 99.95).abs() < 1e-9, "expected 99.95, got {short}");
    }

    #[test]
    fn existing_parameter_is_overwritten() {
        let link = with_timestamp("https://x.test/reel/a/?rc_t=3&x=1", 9).unwrap();
        assert_eq!(link, "https://x.test/reel/a/?x=1&rc_t=9");
    }

    #[test]
    fn permalink_falls_back_to_page() {
        let page = "https://x.test/stories/abc/";
        assert_eq!(resolve_permalink(["/explore/", "mailto:a@b"], page), page);
        assert!(is_permalink_path("/someone/reel/xyz/"));
        assert!(!is_permalink_path("/p/"));
    }

    #[test]
    fn referrer_is_consulted_when_url_was_stripped() {
        assert_eq!(
            capture_target("https://x.test/reel/a/", Some("https://x.test/p/b/?rc_t=7")),
            Some(7)
        );
        assert_eq!(
            capture_target("https://x.test/reel/a/?rc_t=3", Some("https://x.test/?rc_t=7")),
            Some(3)
        );
    }

    #[test]
    fn retries_until_duration_known_then_converges() {
        let mut seeker = TimestampSeeker::new(CFG);
        let url = "https://x.test/reel/a/?rc_t=7";
        assert_eq!(seeker.arm(url, "/reel/a/", 7), SeekStep::Wait { delay_ms: 120 });

        // Metadata not loaded yet.
        let unknown = Playhead {
            current_time: 0.0,
            duration: f64::NAN,
        };
        assert_eq!(seeker.fire(unknown), SeekStep::Wait { delay_ms: 120 });
        assert_eq!(seeker.attempts(), 1);

        let loaded = Playhead {
            current_time: 0.0,
            duration: 10.0,
        };
        assert_eq!(
            seeker.fire(loaded),
            SeekStep::Seek {
                to: Some(7.0),
                delay_ms: 220
            }
        );
        let landed = Playhead {
            current_time: 7.02,
            duration: 10.0,
        };
        assert_eq!(seeker.fire(landed), SeekStep::Satisfied);
        assert_eq!(seeker.attempts(), 2);
        assert_eq!(seeker.phase(), SeekPhase::Satisfied);

        // Re-arming the same URL after success is a no-op.
        assert_eq!(seeker.arm(url, "/reel/a/", 7), SeekStep::Idle);
    }

    #[test]
    fn gives_up_after_six_attempts() {
        let mut seeker = TimestampSeeker::new(CFG);
        seeker.arm("https://x.test/p/a/?rc_t=7", "/p/a/", 7);
        let never = Playhead {
            current_time: 0.0,
            duration: f64::NAN,
        };
        let mut fires = 0;
        loop {
            fires += 1;
            match seeker.fire(never) {
                SeekStep::Wait { .. } => {}
                SeekStep::Abandoned => break,
                other => panic!("unexpected step {other:?}"),
            }
            assert!(fires < 20, "seeker never gave up");
        }
        assert_eq!(seeker.attempts(), 6);
        assert_eq!(seeker.phase(), SeekPhase::Abandoned);
        assert_eq!(seeker.fire(never), SeekStep::Idle);
    }

    #[test]
    fn small_drift_skips_the_write() {
        let mut seeker = TimestampSeeker::new(CFG);
        seeker.arm("https://x.test/p/a/", "/p/a/", 5);
        let near = Playhead {
            current_time: 5.3,
            duration: 10.0,
        };
        assert_eq!(
            seeker.fire(near),
            SeekStep::Seek {
                to: None,
                delay_ms: 220
            }
        );
        assert_eq!(seeker.fire(near), SeekStep::Satisfied);
    }

    #[test]
    fn new_url_resets_attempts() {
        let mut seeker = TimestampSeeker::new(CFG);
        seeker.arm("https://x.test/p/a/", "/p/a/", 5);
        seeker.fire(Playhead {
            current_time: 0.0,
            duration: f64::NAN,
        });
        assert_eq!(seeker.attempts(), 1);
        seeker.arm("https://x.test/p/b/", "/p/b/", 5);
        assert_eq!(seeker.attempts(), 0);
    }

    #[test]
    fn leaving_the_page_mid_seek_resets_everything() {
        let mut seeker = TimestampSeeker::new(CFG);
        let url = "https://x.test/reel/a/?rc_t=7";
        seeker.arm(url, "/reel/a/", 7);
        seeker.fire(Playhead {
            current_time: 0.0,
            duration: f64::NAN,
        });
        assert_eq!(seeker.path(), Some("/reel/a/"), "armed path is kept");

        assert!(!seeker.leave(url), "same URL is not a navigation");
        assert!(seeker.is_active(), "seek continues on the same URL");

        assert!(
            seeker.leave("https://x.test/reel/b/"),
            "in-flight seek is reported so its hold can be released"
        );
        assert_eq!(seeker.phase(), SeekPhase::Idle);
        assert_eq!(seeker.attempts(), 0, "attempt counter resets");
        assert_eq!(seeker.url(), None, "URL is forgotten");
        assert_eq!(seeker.path(), None, "path is forgotten");
        assert!(!seeker.leave("https://x.test/reel/c/"), "nothing left to cancel");
    }

    #[test]
    fn leaving_after_success_reports_no_seek() {
        let mut seeker = TimestampSeeker::new(CFG);
        seeker.arm("https://x.test/p/a/", "/p/a/", 5);
        let near = Playhead {
            current_time: 5.0,
            duration: 10.0,
        };
        seeker.fire(near);
        assert_eq!(seeker.fire(near), SeekStep::Satisfied);
        assert!(!seeker.leave("https://x.test/p/b/"), "nothing was in flight");
        assert_eq!(seeker.url(), None, "URL is still forgotten");
    }

    #[test]
    fn center_video_wins_over_larger_visible_area() {
        let viewport = Rect::new(0.0, 0.0, 1000.0, 800.0);
        let big_top = Rect::new(0.0, -100.0, 1000.0, 380.0);
        let small_center = Rect::new(400.0, 350.0, 600.0, 450.0);
        let rects = [big_top, small_center];

        assert_eq!(PrimaryPolicy::new().select(&rects, viewport), Some(1));
        let area_only = PrimaryPolicy {
            center_first: false,
        };
        assert_eq!(area_only.select(&rects, viewport), Some(0));
        assert_eq!(PrimaryPolicy::new().select(&[], viewport), None);
    }

    #[test]
    fn applied_marker_is_per_url_and_video() {
        let mut marker = AppliedMarker::new();
        marker.mark("https://x.test/p/a/?rc_t=1", 3_u32);
        assert!(marker.is_applied("https://x.test/p/a/?rc_t=1", &3));
        assert!(!marker.is_applied("https://x.test/p/a/?rc_t=1", &4));
        assert!(!marker.is_applied("https://x.test/p/a/?rc_t=2", &3));
    }
}
