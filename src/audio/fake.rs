//! Scripted stand-in for `pactl`, shared by the audio and widget tests.

use super::error::AudioError;
use super::pactl::{parse_mute, parse_volume, VolumeBackend};
use super::volume::Direction;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Script {
    volume_text: HashMap<Direction, String>,
    mute_text: HashMap<Direction, String>,
    fail_commands: bool,
    set_calls: Vec<(Direction, i32)>,
    mute_calls: Vec<(Direction, bool)>,
}

/// Answers `get-*` queries from canned `pactl` output and records `set-*` calls.
pub(crate) struct FakeBackend {
    script: Mutex<Script>,
}

impl FakeBackend {
    /// Both directions report `volume`% and unmuted.
    pub(crate) fn with_volume(volume: i32) -> Self {
        let backend = Self {
            script: Mutex::new(Script::default()),
        };
        for direction in Direction::BOTH {
            backend.report(direction, &volume_line(volume), "Mute: no");
        }
        backend
    }

    /// Replace what the next `get-*` queries for `direction` print.
    pub(crate) fn report(&self, direction: Direction, volume_text: &str, mute_text: &str) {
        let mut script = self.lock();
        script
            .volume_text
            .insert(direction, volume_text.to_string());
        script.mute_text.insert(direction, mute_text.to_string());
    }

    /// Make every command fail as if `pactl` exited non-zero.
    pub(crate) fn fail_commands(&self, fail: bool) {
        self.lock().fail_commands = fail;
    }

    pub(crate) fn set_calls(&self) -> Vec<(Direction, i32)> {
        self.lock().set_calls.clone()
    }

    pub(crate) fn mute_calls(&self) -> Vec<(Direction, bool)> {
        self.lock().mute_calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn check(&self, command: String) -> Result<(), AudioError> {
        if self.lock().fail_commands {
            return Err(AudioError::OsCommandFailed {
                command,
                detail: "exited with exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

fn volume_line(volume: i32) -> String {
    format!("Volume: front-left: 1000 / {volume}% / -0.00 dB,   front-right: 1000 / {volume}% / -0.00 dB")
}

impl VolumeBackend for FakeBackend {
    fn volume(&self, direction: Direction) -> Result<i32, AudioError> {
        let command = format!("get-{}-volume", direction.kind());
        self.check(command.clone())?;
        let text = self.lock().volume_text.get(&direction).cloned().unwrap_or_default();
        parse_volume(&command, &text)
    }

    fn muted(&self, direction: Direction) -> Result<bool, AudioError> {
        let command = format!("get-{}-mute", direction.kind());
        self.check(command.clone())?;
        let text = self.lock().mute_text.get(&direction).cloned().unwrap_or_default();
        parse_mute(&command, &text)
    }

    fn set_volume(&self, direction: Direction, percent: i32) -> Result<(), AudioError> {
        self.check(format!("set-{}-volume", direction.kind()))?;
        let mut script = self.lock();
        script.set_calls.push((direction, percent));
        script.volume_text.insert(direction, volume_line(percent));
        Ok(())
    }

    fn set_muted(&self, direction: Direction, muted: bool) -> Result<(), AudioError> {
        self.check(format!("set-{}-mute", direction.kind()))?;
        let mut script = self.lock();
        script.mute_calls.push((direction, muted));
        let text = if muted { "Mute: yes" } else { "Mute: no" };
        script.mute_text.insert(direction, text.to_string());
        Ok(())
    }
}
