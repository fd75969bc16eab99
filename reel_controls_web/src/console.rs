// Copyright 2026 the Reel Controls Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Developer-console [`TraceSink`].

use reel_controls_core::storage::StoreError;
use reel_controls_core::timestamp::SeekStep;
use reel_controls_core::trace::{
    AttachEvent, ContextId, ControlRole, LocateEvent, SeekEvent, TraceSink, UnmutePhase,
};
use reel_controls_core::volume::{AudioCommand, Toggle};
use wasm_bindgen::JsValue;

const PREFIX: &str = "[reel-controls]";

/// Writes one line per event with `console.debug`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl TraceSink for ConsoleSink {
    fn on_attach(&mut self, event: &AttachEvent) {
        emit(&attach_line(event));
    }

    fn on_locate(&mut self, event: &LocateEvent) {
        emit(&locate_line(event));
    }

    fn on_storage_failure(&mut self, error: &StoreError) {
        emit(&format!("{PREFIX} storage {error}"));
    }

    fn on_seek(&mut self, event: &SeekEvent) {
        emit(&seek_line(event));
    }

    fn on_audio(&mut self, context: ContextId, command: &AudioCommand) {
        emit(&audio_line(context, command));
    }

    fn on_unmute_gate(&mut self, context: ContextId, phase: UnmutePhase) {
        let phase = match phase {
            UnmutePhase::Deferred => "deferred",
            UnmutePhase::Applied => "applied",
        };
        emit(&format!("{PREFIX} ctx={} unmute {phase}", context.0));
    }

    fn on_share(&mut self, copied: bool) {
        let outcome = if copied { "copied" } else { "failed" };
        emit(&format!("{PREFIX} share {outcome}"));
    }
}

fn emit(line: &str) {
    web_sys::console::debug_1(&JsValue::from_str(line));
}

fn attach_line(event: &AttachEvent) -> String {
    format!(
        "{PREFIX} ctx={} attach native={}",
        event.context.0, event.native_found
    )
}

fn locate_line(event: &LocateEvent) -> String {
    let role = match event.role {
        ControlRole::Volume => "volume",
        ControlRole::LeftUi => "left",
    };
    format!(
        "{PREFIX} ctx={} locate role={role} tier={}",
        event.context.0,
        event.tier.as_str()
    )
}

fn seek_line(event: &SeekEvent) -> String {
    let step = match event.step {
        SeekStep::Wait { delay_ms } => format!("wait {delay_ms}ms"),
        SeekStep::Seek {
            to: Some(to),
            delay_ms,
        } => format!("seek to={to:.2} verify in {delay_ms}ms"),
        SeekStep::Seek { to: None, delay_ms } => format!("in place, verify in {delay_ms}ms"),
        SeekStep::Satisfied => String::from("satisfied"),
        SeekStep::Abandoned => String::from("abandoned"),
        SeekStep::Idle => String::from("idle"),
    };
    format!(
        "{PREFIX} ctx={} seek attempt={} {step}",
        event.context.0, event.attempt
    )
}

fn audio_line(context: ContextId, command: &AudioCommand) -> String {
    let volume = command
        .volume
        .map_or_else(|| String::from("-"), |v| format!("{v:.2}"));
    let toggle = match command.toggle {
        None => "-",
        Some(Toggle::Native) => "native",
        Some(Toggle::Direct { muted: true }) => "mute",
        Some(Toggle::Direct { muted: false }) => "unmute",
    };
    format!(
        "{PREFIX} ctx={} audio volume={volume} toggle={toggle} expect muted={} volume={:.2}",
        context.0, command.expected.muted, command.expected.volume
    )
}

#[cfg(test)]
mod tests {
    use reel_controls_core::locate::LocateTier;
    use reel_controls_core::volume::MediaAudio;

    use super::*;

    #[test]
    fn lines_name_context_and_outcome() {
        let attach = attach_line(&AttachEvent {
            context: ContextId(4),
            native_found: true,
        });
        assert_eq!(attach, "[reel-controls] ctx=4 attach native=true");

        let locate = locate_line(&LocateEvent {
            context: ContextId(4),
            role: ControlRole::LeftUi,
            tier: LocateTier::Geometric,
        });
        assert_eq!(locate, "[reel-controls] ctx=4 locate role=left tier=geometric");

        let seek = seek_line(&SeekEvent {
            context: ContextId(1),
            attempt: 2,
            step: SeekStep::Seek {
                to: Some(7.0),
                delay_ms: 220,
            },
        });
        assert_eq!(seek, "[reel-controls] ctx=1 seek attempt=2 seek to=7.00 verify in 220ms");
    }

    #[test]
    fn audio_line_shows_expected_state() {
        let line = audio_line(
            ContextId(2),
            &AudioCommand {
                volume: Some(0.5),
                toggle: Some(Toggle::Native),
                expected: MediaAudio {
                    muted: false,
                    volume: 0.5,
                },
            },
        );
        assert_eq!(
            line,
            "[reel-controls] ctx=2 audio volume=0.50 toggle=native expect muted=false volume=0.50"
        );
    }
}
