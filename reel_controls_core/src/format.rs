// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text shown in the overlay.

/// Formats a playback position as `m:ss`. Non-finite or negative input
/// renders as `0:00`.
#[must_use]
pub fn format_clock(seconds: f64) -> String {
    let total = crate::timestamp::share_seconds(seconds);
    format!("{}:{:02}", total / 60, total % 60)
}

/// Formats the elapsed/duration readout, `m:ss / m:ss`.
#[must_use]
pub fn format_time(current: f64, duration: f64) -> String {
    let duration = if crate::timestamp::has_duration(duration) {
        duration
    } else {
        0.0
    };
    format!("{} / {}", format_clock(current), format_clock(duration))
}

/// Formats a volume in `[0, 1]` as a whole percentage.
#[must_use]
pub fn format_percent(volume: f64) -> String {
    let volume = if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    };
    // `abs` folds a clamped `-0.0` into `0`.
    format!("{:.0}%", (volume * 100.0).round().abs())
}

/// Fraction of `duration` elapsed at `current`, in `[0, 1]`.
#[must_use]
pub fn progress_fraction(current: f64, duration: f64) -> f64 {
    if !crate::timestamp::has_duration(duration) || !current.is_finite() {
        return 0.0;
    }
    (current / duration).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readout_formats() {
        assert_eq!(format_time(65.9, 600.0), "1:05 / 10:00");
        assert_eq!(format_time(3.0, f64::NAN), "0:03 / 0:00");
        assert_eq!(format_time(-1.0, f64::INFINITY), "0:00 / 0:00");
    }

    #[test]
    fn percent_rounds() {
        assert_eq!(format_percent(0.8), "80%");
        assert_eq!(format_percent(0.555), "56%");
        assert_eq!(format_percent(f64::NAN), "0%");
        assert_eq!(format_percent(1.7), "100%", "clamped above");
        assert_eq!(format_percent(-0.2), "0%", "clamped below");
        assert_eq!(format_percent(-0.0), "0%", "no negative zero");
    }

    #[test]
    fn fraction_is_clamped() {
        assert_eq!(progress_fraction(5.0, 10.0), 0.5);
        assert_eq!(progress_fraction(12.0, 10.0), 1.0);
        assert_eq!(progress_fraction(5.0, f64::NAN), 0.0);
    }
}
