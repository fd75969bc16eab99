// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mute/volume state machine.
//!
//! The machine decides; the browser crate executes. Every decision comes
//! back as an [`AudioCommand`] describing an optional volume write and an
//! optional mute toggle. Toggles prefer [`Toggle::Native`], a simulated click
//! on the host page's own volume button, so the host's internal state and
//! icon stay authoritative; [`Toggle::Direct`] writes the element's `muted`
//! flag and is used only when no native button is reachable.
//!
//! # Activation gate
//!
//! Browsers refuse to unmute without a user gesture. When the stored
//! preference asks for sound but the page has no user activation,
//! [`MuteMachine::attach`] records a pending unmute instead of acting, and
//! [`MuteMachine::gesture`] releases it exactly once on the next trusted
//! click or keydown inside the primary video's host.

use crate::storage::StoredPreference;

/// Volume restored when unmuting from a silent level.
pub const UNMUTE_FLOOR_VOLUME: f64 = 0.5;

/// Snapshot of a media element's audio flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaAudio {
    /// The element's `muted` flag.
    pub muted: bool,
    /// The element's `volume`, in `[0, 1]`.
    pub volume: f64,
}

impl MediaAudio {
    /// The audible state this snapshot represents.
    #[must_use]
    pub fn state(self) -> AudioState {
        if self.muted || self.volume <= 0.0 {
            AudioState::Muted
        } else {
            AudioState::Unmuted(self.volume.min(1.0))
        }
    }
}

/// Audible state of a video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AudioState {
    /// Muted, or at zero volume.
    Muted,
    /// Audible at the given volume in `(0, 1]`.
    Unmuted(f64),
}

impl AudioState {
    /// Returns `true` for [`AudioState::Muted`].
    #[must_use]
    pub fn is_muted(self) -> bool {
        matches!(self, Self::Muted)
    }
}

/// How a mute toggle is carried out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    /// Simulate a click on the native volume button.
    Native,
    /// Write the element's `muted` flag.
    Direct {
        /// Value to write.
        muted: bool,
    },
}

/// A decided change to a video's audio.
///
/// Apply `volume` first, then `toggle`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioCommand {
    /// Volume to write, if any.
    pub volume: Option<f64>,
    /// Mute toggle to perform, if any.
    pub toggle: Option<Toggle>,
    /// The state the element is expected to be in afterwards; this is what
    /// gets persisted.
    pub expected: MediaAudio,
}

impl AudioCommand {
    fn toggle_to(muted: bool, native_available: bool) -> Toggle {
        if native_available {
            Toggle::Native
        } else {
            Toggle::Direct { muted }
        }
    }
}

/// The page's user-activation status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserActivation {
    /// A gesture is currently active.
    pub is_active: bool,
    /// A gesture has happened at some point on this page.
    pub has_been_active: bool,
}

impl UserActivation {
    /// Returns `true` if programmatic unmuting is expected to succeed.
    #[must_use]
    pub fn allows_unmute(self) -> bool {
        self.is_active || self.has_been_active
    }
}

/// A user gesture candidate for releasing a pending unmute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gesture {
    /// The event was dispatched by the user agent, not by script.
    pub trusted: bool,
    /// The event target is inside the primary video's host.
    pub inside_primary_host: bool,
}

/// What to do when a context attaches.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttachPlan {
    /// Command to run now, if any.
    pub command: Option<AudioCommand>,
    /// The unmute was deferred behind the activation gate.
    pub deferred: bool,
}

/// What to do when pending intents are released.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReleasePlan {
    /// Command to run, if any.
    pub command: Option<AudioCommand>,
    /// Start playback.
    pub play: bool,
}

/// Per-context mute/volume intent state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MuteMachine {
    pending_unmute: bool,
    pending_play: bool,
}

impl MuteMachine {
    /// A machine with nothing pending.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending_unmute: false,
            pending_play: false,
        }
    }

    /// An unmute is waiting for a user gesture.
    #[must_use]
    pub fn pending_unmute(&self) -> bool {
        self.pending_unmute
    }

    /// Playback is held until a pending seek lands.
    #[must_use]
    pub fn pending_play(&self) -> bool {
        self.pending_play
    }

    /// Flips between muted and unmuted.
    ///
    /// Unmuting from zero volume also restores [`UNMUTE_FLOOR_VOLUME`].
    #[must_use]
    pub fn toggle(media: MediaAudio, native_available: bool) -> AudioCommand {
        match media.state() {
            AudioState::Unmuted(volume) => AudioCommand {
                volume: None,
                toggle: Some(AudioCommand::toggle_to(true, native_available)),
                expected: MediaAudio {
                    muted: true,
                    volume,
                },
            },
            AudioState::Muted => Self::unmute(media, None, native_available),
        }
    }

    /// Unmutes, writing `volume` (or the floor, if the element is silent).
    fn unmute(media: MediaAudio, volume: Option<f64>, native_available: bool) -> AudioCommand {
        let volume = volume
            .filter(|v| v.is_finite() && *v > 0.0)
            .or_else(|| (media.volume <= 0.0).then_some(UNMUTE_FLOOR_VOLUME));
        let toggle = media
            .muted
            .then(|| AudioCommand::toggle_to(false, native_available));
        AudioCommand {
            volume,
            toggle,
            expected: MediaAudio {
                muted: false,
                volume: volume.unwrap_or(media.volume).clamp(0.0, 1.0),
            },
        }
    }

    /// Handles a volume-slider change to `value`.
    ///
    /// Dragging above zero while muted also unmutes.
    #[must_use]
    pub fn slide(media: MediaAudio, value: f64, native_available: bool) -> AudioCommand {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            media.volume
        };
        let unmute = media.muted && value > 0.0;
        AudioCommand {
            volume: Some(value),
            toggle: unmute.then(|| AudioCommand::toggle_to(false, native_available)),
            expected: MediaAudio {
                muted: media.muted && !unmute,
                volume: value,
            },
        }
    }

    /// Reconciles a newly attached video with the stored preference.
    ///
    /// The stored volume is always re-applied. If the preference asks for
    /// sound while the element is muted, the unmute happens now when the page
    /// has user activation and is deferred otherwise.
    pub fn attach(
        &mut self,
        preference: StoredPreference,
        media: MediaAudio,
        activation: UserActivation,
        native_available: bool,
    ) -> AttachPlan {
        let volume = preference.volume.filter(|v| v.is_finite());
        if preference.wants_unmuted() && media.muted {
            if activation.allows_unmute() {
                return AttachPlan {
                    command: Some(Self::unmute(media, volume, native_available)),
                    deferred: false,
                };
            }
            self.pending_unmute = true;
            return AttachPlan {
                command: volume.map(|v| Self::set_volume(media, v)),
                deferred: true,
            };
        }
        AttachPlan {
            command: volume.map(|v| Self::set_volume(media, v)),
            deferred: false,
        }
    }

    fn set_volume(media: MediaAudio, volume: f64) -> AudioCommand {
        let volume = volume.clamp(0.0, 1.0);
        AudioCommand {
            volume: Some(volume),
            toggle: None,
            expected: MediaAudio {
                muted: media.muted,
                volume,
            },
        }
    }

    /// Records that playback should resume once a pending seek lands.
    pub fn hold_for_seek(&mut self) {
        self.pending_play = true;
    }

    /// Offers a user gesture to the gate.
    ///
    /// Returns `Some` at most once per pending unmute: the caller applies the
    /// plan and suppresses the gesture's default action. Untrusted events and
    /// events outside the primary video's host are ignored. Playback held
    /// for a seek is not released here; it waits for [`Self::after_seek`],
    /// so a click during the seek cannot start the video at the wrong time.
    pub fn gesture(
        &mut self,
        gesture: Gesture,
        media: MediaAudio,
        stored_volume: Option<f64>,
        native_available: bool,
    ) -> Option<ReleasePlan> {
        if !gesture.trusted || !gesture.inside_primary_host {
            return None;
        }
        if !std::mem::take(&mut self.pending_unmute) {
            return None;
        }
        let command = media
            .muted
            .then(|| Self::unmute(media, stored_volume, native_available));
        Some(ReleasePlan {
            command,
            play: false,
        })
    }

    /// Called when a held seek has landed (or was abandoned).
    ///
    /// Playback resumes right away (muted playback needs no activation); a
    /// pending unmute is applied only if activation allows it.
    pub fn after_seek(
        &mut self,
        activation: UserActivation,
        media: MediaAudio,
        stored_volume: Option<f64>,
        native_available: bool,
    ) -> ReleasePlan {
        let play = std::mem::take(&mut self.pending_play);
        let command = if self.pending_unmute && activation.allows_unmute() {
            self.pending_unmute = false;
            media
                .muted
                .then(|| Self::unmute(media, stored_volume, native_available))
        } else {
            None
        };
        ReleasePlan { command, play }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUTED: MediaAudio = MediaAudio {
        muted: true,
        volume: 1.0,
    };
    const SILENT: MediaAudio = MediaAudio {
        muted: true,
        volume: 0.0,
    };
    const LOUD: MediaAudio = MediaAudio {
        muted: false,
        volume: 0.7,
    };

    fn wants_sound() -> StoredPreference {
        StoredPreference {
            volume: Some(0.8),
            muted: Some(false),
        }
    }

    #[test]
    fn toggle_prefers_native_click() {
        let cmd = MuteMachine::toggle(LOUD, true);
        assert_eq!(cmd.toggle, Some(Toggle::Native));
        assert_eq!(cmd.volume, None);
        assert!(cmd.expected.muted);

        let cmd = MuteMachine::toggle(LOUD, false);
        assert_eq!(cmd.toggle, Some(Toggle::Direct { muted: true }));
    }

    #[test]
    fn unmute_from_zero_snaps_to_half() {
        let cmd = MuteMachine::toggle(SILENT, false);
        assert_eq!(cmd.toggle, Some(Toggle::Direct { muted: false }));
        assert_eq!(cmd.volume, Some(UNMUTE_FLOOR_VOLUME));
        assert_eq!(cmd.expected, MediaAudio { muted: false, volume: 0.5 });

        // Not muted but at zero: only the volume changes.
        let zero = MediaAudio {
            muted: false,
            volume: 0.0,
        };
        let cmd = MuteMachine::toggle(zero, true);
        assert_eq!(cmd.toggle, None);
        assert_eq!(cmd.volume, Some(UNMUTE_FLOOR_VOLUME));
    }

    #[test]
    fn sliding_up_while_muted_unmutes_through_native() {
        let cmd = MuteMachine::slide(MUTED, 0.3, true);
        assert_eq!(cmd.volume, Some(0.3));
        assert_eq!(cmd.toggle, Some(Toggle::Native));
        assert!(!cmd.expected.muted);

        let cmd = MuteMachine::slide(MUTED, 0.0, true);
        assert_eq!(cmd.toggle, None);
        assert!(cmd.expected.muted);
    }

    #[test]
    fn attach_without_activation_defers_unmute() {
        let mut machine = MuteMachine::new();
        let plan = machine.attach(wants_sound(), MUTED, UserActivation::default(), true);
        assert!(plan.deferred);
        assert!(machine.pending_unmute());
        let cmd = plan.command.expect("stored volume is re-applied");
        assert_eq!(cmd.volume, Some(0.8));
        assert_eq!(cmd.toggle, None, "no native click without activation");
    }

    #[test]
    fn deferred_unmute_fires_exactly_once() {
        let mut machine = MuteMachine::new();
        machine.attach(wants_sound(), MUTED, UserActivation::default(), true);

        let outside = Gesture {
            trusted: true,
            inside_primary_host: false,
        };
        assert_eq!(machine.gesture(outside, MUTED, Some(0.8), true), None);
        let synthetic = Gesture {
            trusted: false,
            inside_primary_host: true,
        };
        assert_eq!(machine.gesture(synthetic, MUTED, Some(0.8), true), None);

        let click = Gesture {
            trusted: true,
            inside_primary_host: true,
        };
        let plan = machine.gesture(click, MUTED, Some(0.8), true).expect("released");
        let cmd = plan.command.expect("unmute command");
        assert_eq!(cmd.toggle, Some(Toggle::Native));
        assert_eq!(cmd.volume, Some(0.8));
        assert!(!machine.pending_unmute());

        assert_eq!(machine.gesture(click, MUTED, Some(0.8), true), None);
    }

    #[test]
    fn attach_with_activation_unmutes_now() {
        let mut machine = MuteMachine::new();
        let activation = UserActivation {
            is_active: false,
            has_been_active: true,
        };
        let plan = machine.attach(wants_sound(), MUTED, activation, false);
        assert!(!plan.deferred);
        let cmd = plan.command.expect("unmute");
        assert_eq!(cmd.toggle, Some(Toggle::Direct { muted: false }));
        assert!(!machine.pending_unmute());
    }

    #[test]
    fn muted_preference_only_restores_volume() {
        let mut machine = MuteMachine::new();
        let pref = StoredPreference {
            volume: Some(0.4),
            muted: Some(true),
        };
        let plan = machine.attach(pref, MUTED, UserActivation::default(), true);
        assert!(!plan.deferred);
        assert_eq!(plan.command.map(|c| c.volume), Some(Some(0.4)));
    }

    #[test]
    fn held_playback_resumes_after_seek() {
        let mut machine = MuteMachine::new();
        machine.attach(wants_sound(), MUTED, UserActivation::default(), true);
        machine.hold_for_seek();

        let plan = machine.after_seek(UserActivation::default(), MUTED, Some(0.8), true);
        assert!(plan.play);
        assert_eq!(plan.command, None, "gate still closed");
        assert!(machine.pending_unmute());
        assert!(!machine.pending_play());
    }

    #[test]
    fn gesture_during_seek_keeps_playback_held() {
        let mut machine = MuteMachine::new();
        machine.attach(wants_sound(), MUTED, UserActivation::default(), true);
        machine.hold_for_seek();

        let click = Gesture {
            trusted: true,
            inside_primary_host: true,
        };
        let plan = machine.gesture(click, MUTED, Some(0.8), true).expect("unmute released");
        assert!(!plan.play, "a gesture must not start playback mid-seek");
        assert!(plan.command.is_some(), "the unmute still goes through");
        assert!(machine.pending_play(), "playback stays held for the seek");

        // Nothing left for a second gesture to release.
        assert_eq!(machine.gesture(click, MUTED, Some(0.8), true), None);

        let landed = machine.after_seek(UserActivation::default(), LOUD, Some(0.8), true);
        assert!(landed.play, "playback resumes once the seek lands");
        assert!(!machine.pending_play());
    }

    #[test]
    fn gesture_with_only_held_playback_is_ignored() {
        let mut machine = MuteMachine::new();
        machine.hold_for_seek();
        let click = Gesture {
            trusted: true,
            inside_primary_host: true,
        };
        assert_eq!(
            machine.gesture(click, LOUD, None, true),
            None,
            "held playback alone does not consume gestures"
        );
        assert!(machine.pending_play(), "hold survives the gesture");
    }
}
